//! Command line definition.

use std::path::PathBuf;

use aegis_config::AegisConfig;
use clap::{Parser, Subcommand};

/// Exit code for a generation failure or stale contracts.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for a request rejected by `aegis validate`.
pub const EXIT_REJECTED: u8 = 2;

/// Compile request contracts into schemas and validate requests against them.
#[derive(Debug, Parser)]
#[command(name = "aegis", version, about)]
pub struct Cli {
    /// Configuration file (TOML or JSON). Defaults to ./aegis.toml when present.
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overriding the configuration.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Print Prometheus metrics to stderr when the command finishes.
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write method and request schema artifacts for every endpoint.
    Generate {
        /// Root of the endpoint source tree.
        #[arg(long, value_name = "DIR")]
        api_root: Option<PathBuf>,
    },
    /// Fail if any artifact is missing, out of date or orphaned.
    Check {
        /// Root of the endpoint source tree.
        #[arg(long, value_name = "DIR")]
        api_root: Option<PathBuf>,
    },
    /// Validate a `{method, query, body}` JSON request against the artifacts.
    Validate {
        /// Endpoint identity, e.g. `messages/[messageID]/index`.
        #[arg(long, value_name = "ID")]
        endpoint: String,
        /// JSON file holding the request.
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
        /// Directory to load artifacts from.
        #[arg(long, value_name = "DIR")]
        schema_root: Option<PathBuf>,
    },
    /// Print the compiled documents for one endpoint.
    Describe {
        /// Endpoint identity.
        #[arg(long, value_name = "ID")]
        endpoint: String,
        /// Root of the endpoint source tree.
        #[arg(long, value_name = "DIR")]
        api_root: Option<PathBuf>,
    },
}

impl Cli {
    /// Applies flags that override configured values.
    pub fn apply_overrides(&self, config: &mut AegisConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.to_lowercase();
        }
        match &self.command {
            Command::Generate { api_root }
            | Command::Check { api_root }
            | Command::Describe { api_root, .. } => {
                if let Some(root) = api_root {
                    config.generator.api_root = root.clone();
                }
            }
            Command::Validate { schema_root, .. } => {
                if let Some(root) = schema_root {
                    config.runtime.schema_root = root.clone();
                }
            }
        }
    }
}
