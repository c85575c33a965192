//! # Aegis Extract
//!
//! Contract extraction for Aegis.
//!
//! Endpoint contracts are declared in a small structural type language. Each
//! endpoint file exports a default request type: a union of objects that
//! carry a `method` literal plus optional `query` and `body` members.
//!
//! ```text
//! type MessageQuery = { messageID: string };
//!
//! export default
//!     | { method: "DELETE", query: MessageQuery }
//!     | { method: "PATCH", query: MessageQuery, body: { content: string @minLength(1) } };
//! ```
//!
//! The extractor resolves named types, aliases, intersections and the
//! built-in generics (`Partial`, `Pick`, `Omit`, `Record`, `Array`) and
//! produces a [`ContractDescriptor`](aegis_core::ContractDescriptor).
//!
//! ## Example
//!
//! ```
//! use aegis_extract::ContractExtractor;
//!
//! let extractor = ContractExtractor::default();
//! let descriptor = extractor
//!     .extract("stories/index", r#"export default { method: "GET" };"#)
//!     .unwrap();
//!
//! assert_eq!(descriptor.method_names(), vec!["GET"]);
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ast;
pub mod discovery;
pub mod env;
mod error;
mod extractor;
mod lexer;
mod lower;
pub mod parser;

pub use discovery::{discover_endpoints, find_files, load_shared_types, EndpointSource};
pub use env::TypeEnv;
pub use error::{DeclarationError, ExtractionError, ExtractionResult, TypeError};
pub use extractor::{ContractExtractor, SharedTypes};
pub use lower::MAX_INTERSECTION_VARIANTS;
pub use parser::{parse_source, MAX_DECLARATION_INPUT_BYTES, MAX_TYPE_NESTING};
