//! Error types for the `aegis` commands.

use std::path::{Path, PathBuf};

use aegis_compiler::CompilationError;
use aegis_extract::ExtractionError;
use aegis_sentinel::SentinelError;
use thiserror::Error;

/// Result type for command operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors raised by the commands.
///
/// Per-endpoint extraction and compilation failures are carried inside
/// reports; they only surface as a `CliError` when a command needs exactly
/// one endpoint.
#[derive(Debug, Error)]
pub enum CliError {
    /// Extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Compilation failed.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// Artifacts could not be loaded or a request could not be validated.
    #[error(transparent)]
    Sentinel(#[from] SentinelError),

    /// A file operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being done.
        action: &'static str,
        /// The file or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The request file is not a JSON document.
    #[error("invalid request file {}: {reason}", path.display())]
    InvalidRequest {
        /// The request file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// No endpoint source with this identity exists.
    #[error("no endpoint '{endpoint}' under {}", root.display())]
    UnknownEndpoint {
        /// Requested endpoint identity.
        endpoint: String,
        /// API root that was searched.
        root: PathBuf,
    },

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl CliError {
    /// Creates an I/O error.
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
