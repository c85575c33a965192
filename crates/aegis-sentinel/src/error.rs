//! Sentinel error types.

use std::fmt;

use aegis_core::{ModelError, SchemaKind};
use serde::{Deserialize, Serialize};

/// Result type for Sentinel operations.
pub type SentinelResult<T> = Result<T, SentinelError>;

/// Errors that can occur while loading schemas or dispatching validation.
///
/// A request that fails validation is not an error; it is a
/// [`ValidationResult`](crate::ValidationResult) with `valid == false`.
#[derive(Debug)]
pub enum SentinelError {
    /// Failed to read an artifact.
    ArtifactLoad(String),

    /// Failed to parse an artifact.
    ArtifactParse(String),

    /// An artifact parsed but is not safe to validate against.
    InvalidArtifact {
        /// Endpoint identity.
        endpoint: String,
        /// What is wrong with it.
        source: ModelError,
    },

    /// Only one of the two artifacts for an endpoint was found.
    IncompleteEndpoint {
        /// Endpoint identity.
        endpoint: String,
        /// The missing document.
        missing: SchemaKind,
    },

    /// Two artifacts claim the same endpoint and kind.
    DuplicateArtifact {
        /// Endpoint identity.
        endpoint: String,
        /// The repeated document.
        kind: SchemaKind,
    },

    /// A method schema whose root is not a string enumeration.
    MalformedMethodSchema {
        /// Endpoint identity.
        endpoint: String,
    },

    /// A pattern constraint does not compile.
    InvalidPattern {
        /// Endpoint identity.
        endpoint: String,
        /// The offending pattern.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },

    /// No contract is registered for the endpoint.
    EndpointNotFound {
        /// Endpoint identity.
        endpoint: String,
    },

    /// IO error.
    Io(std::io::Error),
}

impl std::error::Error for SentinelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidArtifact { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SentinelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactLoad(msg) => write!(f, "failed to load artifact: {}", msg),
            Self::ArtifactParse(msg) => write!(f, "failed to parse artifact: {}", msg),
            Self::InvalidArtifact { endpoint, source } => {
                write!(f, "invalid schema for endpoint '{}': {}", endpoint, source)
            }
            Self::IncompleteEndpoint { endpoint, missing } => {
                write!(
                    f,
                    "endpoint '{}' is missing its {} artifact",
                    endpoint,
                    missing.suffix()
                )
            }
            Self::DuplicateArtifact { endpoint, kind } => {
                write!(
                    f,
                    "endpoint '{}' has more than one {} artifact",
                    endpoint,
                    kind.suffix()
                )
            }
            Self::MalformedMethodSchema { endpoint } => {
                write!(
                    f,
                    "method schema for endpoint '{}' is not a string enumeration",
                    endpoint
                )
            }
            Self::InvalidPattern {
                endpoint,
                pattern,
                message,
            } => {
                write!(
                    f,
                    "invalid pattern '{}' for endpoint '{}': {}",
                    pattern, endpoint, message
                )
            }
            Self::EndpointNotFound { endpoint } => {
                write!(f, "no contract registered for endpoint '{}'", endpoint)
            }
            Self::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl From<std::io::Error> for SentinelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dot path from the request root (`body.pages.3.title`).
    pub pointer: String,
    /// What went wrong.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.pointer, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_load_error_display() {
        let err = SentinelError::ArtifactLoad("file not found".to_string());
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_endpoint_not_found_display() {
        let err = SentinelError::EndpointNotFound {
            endpoint: "messages/[messageID]/index".to_string(),
        };
        assert!(err.to_string().contains("messages/[messageID]/index"));
    }

    #[test]
    fn test_incomplete_endpoint_display() {
        let err = SentinelError::IncompleteEndpoint {
            endpoint: "users/index".to_string(),
            missing: SchemaKind::Request,
        };
        assert!(err.to_string().contains(".request.schema.json"));
    }

    #[test]
    fn test_invalid_artifact_has_source() {
        use std::error::Error;

        let err = SentinelError::InvalidArtifact {
            endpoint: "x".to_string(),
            source: ModelError::MissingRoot {
                name: "Request".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Request"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("body.content", "below minimum length 1");
        assert_eq!(err.to_string(), "body.content: below minimum length 1");
        assert_eq!(
            ValidationError::new("", "expected object, got array").to_string(),
            "expected object, got array"
        );
    }
}
