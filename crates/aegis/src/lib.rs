//! # Aegis
//!
//! Request contracts for HTTP endpoints, compiled ahead of time and enforced
//! at the boundary.
//!
//! Each endpoint declares its accepted requests as a union discriminated on
//! `method`. Aegis turns that declaration into two schema documents and
//! checks every inbound request against them before any endpoint logic runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use aegis::prelude::*;
//!
//! let descriptor = ContractExtractor::default()
//!     .extract(
//!         "messages/[messageID]/index",
//!         r#"
//!         type MessageQuery = { messageID: string };
//!         export default
//!             | { method: "DELETE", query: MessageQuery }
//!             | { method: "PATCH", query: MessageQuery, body: { content: string @minLength(1) } };
//!         "#,
//!     )
//!     .unwrap();
//!
//! let compiled = SchemaCompiler::new().compile(&descriptor).unwrap();
//! let registry = ContractRegistry::from_documents(
//!     [(compiled.endpoint, compiled.method_schema, compiled.request_schema)],
//!     ValidationConfig::default(),
//! )
//! .unwrap();
//!
//! let result = registry
//!     .validate("messages/[messageID]/index", "PUT", None, None)
//!     .unwrap();
//! assert!(result.is_method_not_allowed());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! *.contract ──► ContractExtractor ──► ContractDescriptor
//!                                           │
//!                                   SchemaCompiler
//!                                           │
//!                     method schema + request schema (artifacts)
//!                                           │
//! request ──► ContractRegistry ──► method gate ──► shape check ──► handler
//!                                      │                │
//!                                     405              400
//! ```

#![doc(html_root_url = "https://docs.rs/aegis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the data model
pub use aegis_core as core;

// Re-export the contract extractor
pub use aegis_extract as extract;

// Re-export the schema compiler
pub use aegis_compiler as compiler;

// Re-export the validator runtime
pub use aegis_sentinel as sentinel;

// Re-export configuration
pub use aegis_config as config;

// Re-export telemetry setup
pub use aegis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use aegis::prelude::*;
///
/// let registry = ContractRegistry::default();
/// assert!(registry.is_empty());
/// ```
pub mod prelude {
    pub use aegis_core::{
        ContractDescriptor, MethodContract, ModelError, SchemaArtifact, SchemaDocument, SchemaKind,
        ShapeNode,
    };

    pub use aegis_extract::{ContractExtractor, ExtractionError, SharedTypes};

    pub use aegis_compiler::{CompilationError, CompiledContract, SchemaCompiler};

    pub use aegis_sentinel::{
        ArtifactLoader, ContractRegistry, EndpointValidator, RequestRejection, SentinelError,
        ValidationConfig, ValidationError, ValidationResult,
    };

    pub use aegis_config::{AegisConfig, ConfigLoader};
}
