//! Main configuration struct.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, GeneratorConfig, LoggingConfig, RuntimeConfig, LOG_LEVELS};

/// Complete Aegis configuration.
///
/// Unknown fields anywhere in the document are rejected.
///
/// # Example
///
/// ```
/// use aegis_config::AegisConfig;
///
/// let config = AegisConfig::default();
/// assert_eq!(config.generator.concurrency, 4);
/// assert_eq!(config.runtime.max_errors, 100);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AegisConfig {
    /// Source discovery and artifact generation.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Validator runtime limits and artifact location.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AegisConfig {
    /// Check the configuration for values that would break generation or
    /// validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "generator.concurrency",
                "must be at least 1",
            ));
        }

        for (field, extension) in [
            ("generator.source_extension", &self.generator.source_extension),
            ("generator.types_extension", &self.generator.types_extension),
        ] {
            if extension.is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
            if extension.starts_with('.') {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("give the extension without a leading dot: {extension}"),
                ));
            }
        }

        if self.generator.source_extension == self.generator.types_extension {
            return Err(ConfigError::invalid_value(
                "generator.types_extension",
                "must differ from generator.source_extension",
            ));
        }

        if self.runtime.max_errors == 0 {
            return Err(ConfigError::invalid_value(
                "runtime.max_errors",
                "must be at least 1",
            ));
        }

        if self.runtime.max_depth == 0 {
            return Err(ConfigError::invalid_value(
                "runtime.max_depth",
                "must be at least 1",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "expected one of {}, got '{}'",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = AegisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runtime.schema_root, PathBuf::from("pages/api"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = AegisConfig::default();
        config.generator.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("generator.concurrency"));
    }

    #[test]
    fn test_validate_extensions() {
        let mut empty = AegisConfig::default();
        empty.generator.source_extension = String::new();
        assert!(empty.validate().is_err());

        let mut dotted = AegisConfig::default();
        dotted.generator.types_extension = ".types".to_string();
        assert!(dotted.validate().is_err());

        let mut same = AegisConfig::default();
        same.generator.types_extension = "contract".to_string();
        assert!(same.validate().is_err());
    }

    #[test]
    fn test_validate_runtime_limits() {
        let mut config = AegisConfig::default();
        config.runtime.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "runtime.max_depth"
        ));

        let mut config = AegisConfig::default();
        config.runtime.max_errors = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = AegisConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = AegisConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("[generator]"));
        assert!(toml.contains("[runtime]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml = r#"
            [generator]
            api_root = "app/api"
            type_dirs = ["types", "shared/types"]
            concurrency = 2
            prune_orphans = false

            [runtime]
            max_errors = 25

            [logging]
            format = "json"
        "#;

        let config: AegisConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.generator.api_root, PathBuf::from("app/api"));
        assert_eq!(config.generator.type_dirs.len(), 2);
        assert_eq!(config.generator.concurrency, 2);
        assert!(!config.generator.prune_orphans);
        assert_eq!(config.generator.source_extension, "contract");
        assert_eq!(config.runtime.max_errors, 25);
        assert_eq!(config.runtime.max_depth, 128);
        assert_eq!(config.logging.format, crate::LogFormat::Json);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            [generator]
            api_root = "app/api"
            watch = true
        "#;
        let result: Result<AegisConfig, _> = toml::from_str(toml);
        assert!(result.is_err());

        let result: Result<AegisConfig, _> = toml::from_str("[server]\nport = 1");
        assert!(result.is_err());
    }
}
