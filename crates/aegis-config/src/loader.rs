//! Layered configuration loading.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, a file, a `.env` file and environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{AegisConfig, ConfigError, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables, optionally seeded from a `.env` file
///
/// A file replaces the defaults section by section; keys missing from a
/// section present in the file fall back to their defaults.
///
/// # Example
///
/// ```no_run
/// use aegis_config::ConfigLoader;
///
/// # fn main() -> Result<(), aegis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("aegis.toml")?
///     .with_dotenv()?
///     .with_env_prefix("AEGIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AegisConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AegisConfig::default(),
            env_prefix: None,
        }
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use aegis_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [generator]
    ///     concurrency = 8
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.generator.concurrency, 8);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, format)?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `AEGIS__GENERATOR__CONCURRENCY=8` or `AEGIS__LOGGING__FORMAT=json`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the current directory or its
    /// parents. A missing file is not an error.
    ///
    /// Variables already set in the process environment win over the file.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the result.
    ///
    /// # Example
    ///
    /// ```
    /// use aegis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.generator.source_extension, "contract");
    /// ```
    pub fn load(self) -> Result<AegisConfig, ConfigError> {
        self.load_with(|_| {})
    }

    /// Like [`load`](Self::load), with a final override layer applied after
    /// the environment and before validation. Command line flags go here.
    ///
    /// # Example
    ///
    /// ```
    /// use aegis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .load_with(|config| config.generator.concurrency = 1)
    ///     .unwrap();
    /// assert_eq!(config.generator.concurrency, 1);
    /// ```
    pub fn load_with<F>(mut self, overrides: F) -> Result<AegisConfig, ConfigError>
    where
        F: FnOnce(&mut AegisConfig),
    {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        overrides(&mut self.config);
        self.config.validate()?;

        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<AegisConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::parse(content, extension)
    }

    fn parse(content: &str, format: &str) -> Result<AegisConfig, ConfigError> {
        match format.to_lowercase().as_str() {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let scoped = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&scoped)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let generator = &mut self.config.generator;
        let runtime = &mut self.config.runtime;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            // Generator section
            ["GENERATOR", "API_ROOT"] => {
                generator.api_root = PathBuf::from(value);
            }
            ["GENERATOR", "TYPE_DIRS"] => {
                generator.type_dirs = value
                    .split(',')
                    .map(str::trim)
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            ["GENERATOR", "SOURCE_EXTENSION"] => {
                generator.source_extension = value.to_string();
            }
            ["GENERATOR", "TYPES_EXTENSION"] => {
                generator.types_extension = value.to_string();
            }
            ["GENERATOR", "CONCURRENCY"] => {
                generator.concurrency = parse_integer(key, value)?;
            }
            ["GENERATOR", "PRUNE_ORPHANS"] => {
                generator.prune_orphans = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Runtime section
            ["RUNTIME", "SCHEMA_ROOT"] => {
                runtime.schema_root = PathBuf::from(value);
            }
            ["RUNTIME", "MAX_ERRORS"] => {
                runtime.max_errors = parse_integer(key, value)?;
            }
            ["RUNTIME", "MAX_DEPTH"] => {
                runtime.max_depth = parse_integer(key, value)?;
            }

            // Logging section
            ["LOGGING", "LEVEL"] => {
                logging.level = value.to_lowercase();
            }
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse_integer(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected non-negative integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
