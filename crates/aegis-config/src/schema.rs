//! Configuration section types.

use std::path::PathBuf;

use aegis_sentinel::{ValidationConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ERRORS};
use serde::{Deserialize, Serialize};

/// Generator configuration section.
///
/// Controls where endpoint sources and shared type files are discovered and
/// how the `generate` and `check` commands fan out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Root of the endpoint source tree.
    #[serde(default = "default_api_root")]
    pub api_root: PathBuf,

    /// Directories holding shared type files.
    #[serde(default)]
    pub type_dirs: Vec<PathBuf>,

    /// Extension of endpoint source files, without the dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension of shared type files, without the dot.
    #[serde(default = "default_types_extension")]
    pub types_extension: String,

    /// Maximum endpoints processed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Delete artifacts whose source file no longer exists.
    #[serde(default = "default_true")]
    pub prune_orphans: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            type_dirs: Vec::new(),
            source_extension: default_source_extension(),
            types_extension: default_types_extension(),
            concurrency: default_concurrency(),
            prune_orphans: true,
        }
    }
}

fn default_api_root() -> PathBuf {
    PathBuf::from("pages/api")
}

fn default_source_extension() -> String {
    "contract".to_string()
}

fn default_types_extension() -> String {
    "types".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Runtime configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory the validator runtime loads artifacts from.
    #[serde(default = "default_api_root")]
    pub schema_root: PathBuf,

    /// Errors collected per request before stopping.
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,

    /// Maximum nesting walked per request.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            schema_root: default_api_root(),
            max_errors: DEFAULT_MAX_ERRORS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Settings handed to every endpoint validator.
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig::default()
            .with_max_errors(self.max_errors)
            .with_max_depth(self.max_depth)
    }
}

fn default_max_errors() -> usize {
    DEFAULT_MAX_ERRORS
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logs.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Accepted values for [`LoggingConfig::level`].
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.api_root, PathBuf::from("pages/api"));
        assert!(config.type_dirs.is_empty());
        assert_eq!(config.source_extension, "contract");
        assert_eq!(config.types_extension, "types");
        assert_eq!(config.concurrency, 4);
        assert!(config.prune_orphans);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: GeneratorConfig = toml::from_str("concurrency = 8").unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.source_extension, "contract");
        assert!(config.prune_orphans);
    }

    #[test]
    fn test_runtime_validation_config() {
        let runtime = RuntimeConfig {
            max_errors: 5,
            max_depth: 16,
            ..Default::default()
        };
        let validation = runtime.validation_config();
        assert_eq!(validation.max_errors, 5);
        assert_eq!(validation.max_depth, 16);
        assert_eq!(RuntimeConfig::default().validation_config(), ValidationConfig::default());
    }

    #[test]
    fn test_log_format_serialization() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_section_field_rejected() {
        let result: Result<LoggingConfig, _> = toml::from_str("colour = true");
        assert!(result.is_err());
    }
}
