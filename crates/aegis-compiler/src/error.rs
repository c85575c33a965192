//! Error types for schema compilation.

use aegis_core::ModelError;
use thiserror::Error;

/// Result type for compilation.
pub type CompilationResult<T> = Result<T, CompilationError>;

/// Errors raised while compiling one endpoint's descriptor.
///
/// Every variant names the endpoint so batch reports need no extra context.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A reference names a definition the descriptor does not carry.
    #[error("{endpoint}: reference to undefined type '{name}'")]
    UnresolvedReference {
        /// Endpoint identity.
        endpoint: String,
        /// The missing definition.
        name: String,
    },

    /// The compiled document is structurally unsound.
    #[error("{endpoint}: {source}")]
    Model {
        /// Endpoint identity.
        endpoint: String,
        /// Integrity error.
        #[source]
        source: ModelError,
    },

    /// A `pattern` constraint is not a valid regular expression.
    #[error("{endpoint}: invalid pattern '{pattern}' in '{definition}': {reason}")]
    InvalidPattern {
        /// Endpoint identity.
        endpoint: String,
        /// Definition containing the pattern.
        definition: String,
        /// The pattern.
        pattern: String,
        /// Regex compiler message.
        reason: String,
    },

    /// A lower bound exceeds its upper bound.
    #[error("{endpoint}: unsatisfiable bounds in '{definition}': {reason}")]
    InvalidBounds {
        /// Endpoint identity.
        endpoint: String,
        /// Definition containing the bounds.
        definition: String,
        /// Which bounds conflict.
        reason: String,
    },

    /// A document could not be rendered.
    #[error("{endpoint}: failed to render schema: {source}")]
    Render {
        /// Endpoint identity.
        endpoint: String,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
}

impl CompilationError {
    /// Returns the endpoint identity.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::UnresolvedReference { endpoint, .. }
            | Self::Model { endpoint, .. }
            | Self::InvalidPattern { endpoint, .. }
            | Self::InvalidBounds { endpoint, .. }
            | Self::Render { endpoint, .. } => endpoint,
        }
    }
}
