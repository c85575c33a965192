//! Extraction error types.

use std::path::PathBuf;

use aegis_core::ModelError;
use thiserror::Error;

use crate::ast::Position;

/// Result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Syntax errors in a declaration file.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeclarationError {
    /// Input exceeded the size limit.
    #[error("input exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    InputTooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual input length in bytes.
        actual_bytes: usize,
    },

    /// Type expressions were nested too deeply.
    #[error("type nesting exceeds limit of {max_depth} at {position}")]
    NestingTooDeep {
        /// Maximum allowed depth.
        max_depth: usize,
        /// Where the limit was hit.
        position: Position,
    },

    /// A character that starts no token.
    #[error("unexpected character `{found}` at {position}")]
    UnexpectedCharacter {
        /// The character.
        found: char,
        /// Where it was found.
        position: Position,
    },

    /// A token the grammar does not allow here.
    #[error("unexpected {found} at {position}, expected {expected}")]
    UnexpectedToken {
        /// What the parser wanted.
        expected: &'static str,
        /// What it got.
        found: String,
        /// Where.
        position: Position,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString {
        /// Opening quote position.
        position: Position,
    },

    /// A block comment without its closing `*/`.
    #[error("unterminated block comment starting at {position}")]
    UnterminatedComment {
        /// Comment start position.
        position: Position,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number `{raw}` at {position}")]
    InvalidNumber {
        /// Raw text.
        raw: String,
        /// Where.
        position: Position,
    },

    /// More than one `export default`.
    #[error("second `export default` at {position}")]
    DuplicateDefault {
        /// Position of the second export.
        position: Position,
    },

    /// An annotation name the language does not define.
    #[error("unknown annotation `@{name}` at {position}")]
    UnknownAnnotation {
        /// Annotation name.
        name: String,
        /// Where.
        position: Position,
    },

    /// An annotation with a missing or ill-typed argument.
    #[error("invalid argument for `@{name}` at {position}: {reason}")]
    InvalidAnnotation {
        /// Annotation name.
        name: String,
        /// What is wrong.
        reason: &'static str,
        /// Where.
        position: Position,
    },
}

/// Errors raised while resolving declared types into shapes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A name that is neither declared nor built in.
    #[error("unresolved type `{name}` at {position}")]
    Unresolved {
        /// The name.
        name: String,
        /// Where it was used.
        position: Position,
    },

    /// A name declared twice.
    #[error("type `{name}` declared more than once (second at {position})")]
    DuplicateType {
        /// The name.
        name: String,
        /// Position of the second declaration.
        position: Position,
    },

    /// A declaration that reuses a built-in name.
    #[error("`{name}` is a built-in type and cannot be redeclared (at {position})")]
    ReservedName {
        /// The name.
        name: String,
        /// Where.
        position: Position,
    },

    /// An alias that expands back to itself without any structure.
    #[error("type alias `{name}` expands to itself")]
    CircularAlias {
        /// The alias.
        name: String,
    },

    /// A generic applied to the wrong number of arguments.
    #[error("`{name}` takes {expected} type argument(s), found {found} at {position}")]
    WrongArity {
        /// Generic name.
        name: String,
        /// Expected count.
        expected: usize,
        /// Actual count.
        found: usize,
        /// Where.
        position: Position,
    },

    /// A generic argument of the wrong kind.
    #[error("invalid argument to `{name}` at {position}: {reason}")]
    InvalidGenericArgument {
        /// Generic name.
        name: String,
        /// What is wrong.
        reason: String,
        /// Where.
        position: Position,
    },

    /// `Pick` named a key the object does not declare.
    #[error("`Pick` names key `{key}` which is not declared (at {position})")]
    UnknownKey {
        /// The key.
        key: String,
        /// Where.
        position: Position,
    },

    /// The same property declared twice in one object literal.
    #[error("property `{property}` declared more than once (second at {position})")]
    DuplicateProperty {
        /// The property.
        property: String,
        /// Where.
        position: Position,
    },

    /// An intersection whose members declare one property differently.
    #[error("intersection declares property `{property}` with conflicting types")]
    ConflictingProperty {
        /// The property.
        property: String,
    },

    /// An intersection member that is not an object.
    #[error("intersections are only supported between object types, found {found}")]
    UnsupportedIntersection {
        /// Kind of the offending member.
        found: &'static str,
    },

    /// An intersection whose distribution over unions grows too large.
    #[error("intersection expands to more than {limit} object variants")]
    IntersectionTooLarge {
        /// Maximum number of variants.
        limit: usize,
    },

    /// An intersection that needs a type still being resolved.
    #[error("type `{name}` is used in an intersection inside its own definition")]
    RecursiveIntersection {
        /// The type.
        name: String,
    },

    /// An annotation applied to a shape it cannot constrain.
    #[error("`@{annotation}` cannot be applied to {target} (at {position})")]
    MisplacedAnnotation {
        /// Annotation name.
        annotation: &'static str,
        /// Kind of the annotated shape.
        target: &'static str,
        /// Where.
        position: Position,
    },
}

/// Errors raised while extracting one endpoint's contract.
///
/// Every variant that concerns a single endpoint carries its identity, so a
/// batch can report failures without extra bookkeeping.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The endpoint file does not parse.
    #[error("{endpoint}: {source}")]
    Declaration {
        /// Endpoint identity.
        endpoint: String,
        /// Syntax error.
        #[source]
        source: DeclarationError,
    },

    /// A declared type does not resolve.
    #[error("{endpoint}: {source}")]
    Type {
        /// Endpoint identity.
        endpoint: String,
        /// Resolution error.
        #[source]
        source: TypeError,
    },

    /// The endpoint file has no `export default`.
    #[error("{endpoint}: no `export default` request type")]
    MissingDefault {
        /// Endpoint identity.
        endpoint: String,
    },

    /// The request type is not a union discriminated on `method`.
    #[error("{endpoint}: request type is not discriminated on `method`: {reason}")]
    NotDiscriminated {
        /// Endpoint identity.
        endpoint: String,
        /// What is wrong.
        reason: String,
    },

    /// A `method` literal that is not an HTTP method.
    #[error("{endpoint}: `{method}` is not an HTTP method")]
    InvalidMethod {
        /// Endpoint identity.
        endpoint: String,
        /// The literal.
        method: String,
    },

    /// Two request members claim the same method.
    #[error("{endpoint}: method {method} is declared by more than one request member")]
    DuplicateMethod {
        /// Endpoint identity.
        endpoint: String,
        /// The method.
        method: String,
    },

    /// A request member declares a key other than `method`, `query` and `body`.
    #[error("{endpoint}: unexpected request field `{field}` (only method, query and body are allowed)")]
    UnexpectedRequestField {
        /// Endpoint identity.
        endpoint: String,
        /// The field.
        field: String,
    },

    /// The extracted descriptor is structurally invalid.
    #[error("{endpoint}: {source}")]
    Model {
        /// Endpoint identity.
        endpoint: String,
        /// Model error.
        #[source]
        source: ModelError,
    },

    /// A shared type file is invalid.
    #[error("shared types {}: {message}", path.display())]
    SharedTypes {
        /// The file.
        path: PathBuf,
        /// What is wrong.
        message: String,
    },

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ExtractionError {
    /// Returns the endpoint identity for per-endpoint errors.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Declaration { endpoint, .. }
            | Self::Type { endpoint, .. }
            | Self::MissingDefault { endpoint }
            | Self::NotDiscriminated { endpoint, .. }
            | Self::InvalidMethod { endpoint, .. }
            | Self::DuplicateMethod { endpoint, .. }
            | Self::UnexpectedRequestField { endpoint, .. }
            | Self::Model { endpoint, .. } => Some(endpoint),
            Self::SharedTypes { .. } | Self::Io { .. } => None,
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
