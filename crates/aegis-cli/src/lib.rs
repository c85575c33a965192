//! # Aegis CLI
//!
//! The `aegis` command and the library behind it.
//!
//! | Command | Does | Exit code |
//! |---------|------|-----------|
//! | `generate` | Extracts, compiles and writes artifacts for every endpoint | 1 if any endpoint failed |
//! | `check` | Rebuilds in memory and compares with artifacts on disk | 1 on any drift |
//! | `validate` | Validates a JSON request file against loaded artifacts | 2 if rejected |
//! | `describe` | Prints one endpoint's compiled documents | 1 on error |
//!
//! Each command is a plain async function so it can be driven from tests or
//! other tools without going through the binary.

#![doc(html_root_url = "https://docs.rs/aegis-cli/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod check;
pub mod cli;
pub mod describe;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod validate;

pub use check::{check, CheckReport, StaleContract, StaleStatus};
pub use cli::{Cli, Command, EXIT_FAILURE, EXIT_REJECTED};
pub use describe::{describe, EndpointDescription};
pub use error::{CliError, CliResult};
pub use generate::{generate, EndpointReport, GenerateOutcome, GenerateReport};
pub use pipeline::{ContractBuild, EndpointBuild, Pipeline};
pub use validate::{read_request, validate};
