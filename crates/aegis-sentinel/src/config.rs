//! Configuration for the validator runtime.

use serde::{Deserialize, Serialize};

/// Default cap on collected errors per request.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Default cap on value and reference nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration for validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Collection stops once this many errors are recorded.
    pub max_errors: usize,
    /// Deeper values are rejected instead of walked.
    pub max_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ValidationConfig {
    /// Sets the error cap. Zero is treated as one.
    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    /// Sets the nesting cap.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validation_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.max_errors, 100);
        assert_eq!(config.max_depth, 128);
    }

    #[test]
    fn test_builders() {
        let config = ValidationConfig::default()
            .with_max_errors(0)
            .with_max_depth(8);
        assert_eq!(config.max_errors, 1);
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ValidationConfig = serde_json::from_str(r#"{"max_errors": 5}"#).unwrap();
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.max_depth, 128);
    }
}
