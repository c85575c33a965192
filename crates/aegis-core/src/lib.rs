//! # Aegis Core
//!
//! Shared data model for the Aegis request-contract pipeline.
//!
//! This crate provides the types every other Aegis crate speaks:
//!
//! - [`ShapeNode`] - Recursive description of permissible JSON values
//! - [`ContractDescriptor`] - Per-endpoint record of allowed methods and their request shapes
//! - [`SchemaDocument`] - Compiled, self-contained definitions table plus root reference
//! - [`SchemaArtifact`] - On-disk envelope around a schema document
//! - [`ModelError`] - Structural errors raised by the model itself
//!
//! The pipeline is `descriptor -> (compiler) -> documents -> (sentinel) -> validation result`.
//! Everything here is immutable once built and safe to share across threads.

#![doc(html_root_url = "https://docs.rs/aegis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod descriptor;
pub mod document;
mod error;
pub mod shape;

pub use descriptor::{ContractDescriptor, ContractDescriptorBuilder, MethodContract};
pub use document::{
    SchemaArtifact, SchemaDocument, SchemaKind, ARTIFACT_FORMAT, GENERATED_BY,
    METHOD_SCHEMA_SUFFIX, REQUEST_SCHEMA_SUFFIX,
};
pub use error::{ModelError, ModelResult};
pub use shape::{value_type_name, Constraints, ObjectShapeBuilder, PrimitiveKind, ShapeNode};
