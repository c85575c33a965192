//! Model error types.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Structural errors raised while building or checking model values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A method was declared more than once for one endpoint.
    #[error("method {method} is declared more than once for endpoint '{endpoint}'")]
    DuplicateMethod {
        /// Endpoint identity.
        endpoint: String,
        /// The repeated method.
        method: String,
    },

    /// A descriptor has no methods at all.
    #[error("endpoint '{endpoint}' declares no methods")]
    EmptyContract {
        /// Endpoint identity.
        endpoint: String,
    },

    /// A reference names a definition that does not exist.
    #[error("reference to undefined definition '{name}' (from '{from}')")]
    DanglingReference {
        /// The unresolved definition name.
        name: String,
        /// The definition (or root) the reference was found in.
        from: String,
    },

    /// The root reference of a document does not resolve.
    #[error("root definition '{name}' is missing")]
    MissingRoot {
        /// The root reference name.
        name: String,
    },

    /// A definition can reach itself without consuming any value structure.
    #[error("definition '{name}' refers back to itself without an enclosing object or array")]
    UnguardedCycle {
        /// A definition on the cycle.
        name: String,
    },

    /// An artifact carries an unknown format tag.
    #[error("unsupported schema artifact format '{found}' (expected '{expected}')")]
    UnsupportedFormat {
        /// Format tag found in the artifact.
        found: String,
        /// Format tag this build understands.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_method_display() {
        let err = ModelError::DuplicateMethod {
            endpoint: "messages/[messageID]/index".to_string(),
            method: "PATCH".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PATCH"));
        assert!(msg.contains("messages/[messageID]/index"));
    }

    #[test]
    fn test_unguarded_cycle_display() {
        let err = ModelError::UnguardedCycle {
            name: "Loop".to_string(),
        };
        assert!(err.to_string().contains("Loop"));
    }
}
