//! # Aegis Compiler
//!
//! Turns a [`ContractDescriptor`](aegis_core::ContractDescriptor) into the
//! two schema documents the runtime validates against:
//!
//! - the **method schema**, whose root `RequestMethod` is a string
//!   enumeration of the allowed methods in declaration order;
//! - the **request schema**, whose root `Request` is a union with one closed
//!   object branch per method. Each branch fixes `method` to a literal and
//!   describes `query` and `body`.
//!
//! Named shapes are flattened into the document's definitions table under
//! sanitized, unique names. Recursive types compile to reference cycles.
//!
//! ## Example
//!
//! ```
//! use aegis_compiler::SchemaCompiler;
//! use aegis_core::{ContractDescriptor, MethodContract, ShapeNode};
//! use http::Method;
//!
//! let descriptor = ContractDescriptor::builder("stories/index")
//!     .method(Method::GET, MethodContract::new())
//!     .build()
//!     .unwrap();
//!
//! let compiled = SchemaCompiler::new().compile(&descriptor).unwrap();
//! assert_eq!(compiled.method_schema.root, "RequestMethod");
//! assert_eq!(compiled.request_schema.root, "Request");
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-compiler/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifact;
mod compiler;
mod error;
mod naming;

pub use artifact::{artifact_kind, artifact_path, artifact_source, render_artifact};
pub use compiler::{CompiledContract, RenderedContract, SchemaCompiler};
pub use error::{CompilationError, CompilationResult};
pub use naming::{sanitize_name, METHOD_ROOT, REQUEST_ROOT};
