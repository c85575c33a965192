//! Typed configuration for Aegis.
//!
//! This crate provides the configuration shared by the `aegis` command line
//! tool and by services embedding the validator runtime:
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`AegisConfig`] has three sections:
//!
//! - [`GeneratorConfig`] - where sources live and how generation fans out
//! - [`RuntimeConfig`] - where artifacts are loaded from and validation limits
//! - [`LoggingConfig`] - log level and output format
//!
//! # Example
//!
//! ```no_run
//! use aegis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), aegis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("aegis.toml")?
//!     .with_env_prefix("AEGIS")
//!     .load()?;
//!
//! println!("Sources under: {}", config.generator.api_root.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [generator]
//! api_root = "pages/api"
//! type_dirs = ["types"]
//! source_extension = "contract"
//! types_extension = "types"
//! concurrency = 4
//! prune_orphans = true
//!
//! [runtime]
//! schema_root = "pages/api"
//! max_errors = 100
//! max_depth = 128
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form
//! `PREFIX__SECTION__KEY`:
//!
//! - `AEGIS__GENERATOR__CONCURRENCY=8`
//! - `AEGIS__GENERATOR__TYPE_DIRS=types,shared/types`
//! - `AEGIS__RUNTIME__MAX_ERRORS=20`
//! - `AEGIS__LOGGING__FORMAT=json`

#![doc(html_root_url = "https://docs.rs/aegis-config/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

/// Environment variable prefix used by the `aegis` binary.
pub const ENV_PREFIX: &str = "AEGIS";

/// Configuration file the `aegis` binary reads when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "aegis.toml";
