//! # Aegis Sentinel
//!
//! Validator runtime for compiled request contracts.
//!
//! Every inbound request passes through Sentinel before any endpoint logic
//! runs. Validation happens in two stages:
//!
//! 1. **Method gate**: the method is checked against the endpoint's method
//!    schema. A disallowed method stops here with exactly one error,
//!    `{pointer: "method", message: "method not allowed"}`.
//! 2. **Shape check**: the `{method, query, body}` triple is checked against
//!    the request schema's union. When no branch matches, the errors of the
//!    branch whose `method` literal matches are reported.
//!
//! # Architecture
//!
//! ```text
//!     *.method.schema.json      *.request.schema.json
//!               │                         │
//!               └──────────┬──────────────┘
//!                          │ load once at startup
//!               ┌──────────▼──────────────┐
//!               │   ContractRegistry      │  endpoint → EndpointValidator
//!               └──────────┬──────────────┘
//!                          │ validate(endpoint, method, query, body)
//!               ┌──────────▼──────────────┐
//!               │   ValidationResult      │  {valid, errors}
//!               └──────────┬──────────────┘
//!                          │ rejection()
//!                  405 / 400 client error
//! ```
//!
//! # Example
//!
//! ```no_run
//! use aegis_sentinel::{ContractRegistry, ValidationConfig};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), aegis_sentinel::SentinelError> {
//! let registry = ContractRegistry::load_dir("pages/api", ValidationConfig::default()).await?;
//!
//! let result = registry.validate(
//!     "messages/[messageID]/index",
//!     "PATCH",
//!     Some(&json!({"messageID": "abc"})),
//!     Some(&json!({"content": "hi"})),
//! )?;
//! assert!(result.valid);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-sentinel/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod rejection;
pub mod validation;

// Re-exports for convenience
pub use artifact::ArtifactLoader;
pub use config::{ValidationConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ERRORS};
pub use endpoint::EndpointValidator;
pub use error::{SentinelError, SentinelResult, ValidationError};
pub use registry::{ContractRegistry, UNKNOWN_ENDPOINT_LABEL, VALIDATIONS_TOTAL};
pub use rejection::{RejectionBody, RequestRejection};
pub use validation::{SchemaValidator, ValidationResult, METHOD_NOT_ALLOWED};
