//! Syntax tree for contract declaration files.

use std::fmt;

/// Line and column of a token, both starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number.
    pub line: usize,
    /// Column number, counted in characters.
    pub column: usize,
}

impl Position {
    /// Computes the position of a byte offset in `input`.
    pub fn locate(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = input.get(..offset).unwrap_or(input);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A parsed declaration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    /// Named type declarations in source order.
    pub declarations: Vec<TypeDeclaration>,
    /// The `export default` type, if any.
    pub default: Option<DefaultExport>,
}

/// `type Name = ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    /// Declared name.
    pub name: String,
    /// Declared type.
    pub ty: TypeExpr,
    /// Position of the name.
    pub position: Position,
}

/// `export default ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultExport {
    /// Exported type.
    pub ty: TypeExpr,
    /// Position of the `export` keyword.
    pub position: Position,
}

/// Built-in primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `unknown`
    Unknown,
}

impl KeywordType {
    /// Maps an identifier to a keyword type.
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Literal values usable as types and annotation arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// String literal.
    String(String),
    /// Numeric literal.
    Number(f64),
    /// `true` or `false`.
    Boolean(bool),
}

impl LiteralValue {
    /// Converts the literal into a JSON value. Whole numbers become integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Primitive keyword.
    Keyword(KeywordType),
    /// Literal type.
    Literal(LiteralValue),
    /// Object literal type.
    Object(Vec<ObjectMember>),
    /// `T[]`
    Array(Box<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `A & B`
    Intersection(Vec<TypeExpr>),
    /// A named type, optionally applied to arguments.
    Named {
        /// Type name.
        name: String,
        /// Generic arguments.
        args: Vec<TypeExpr>,
        /// Position of the name.
        position: Position,
    },
    /// A type followed by annotations.
    Annotated {
        /// Annotated type.
        inner: Box<TypeExpr>,
        /// Annotations in source order.
        annotations: Vec<SpannedAnnotation>,
    },
}

/// A member of an object literal type.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    /// `name: T` or `name?: T`
    Property {
        /// Property name.
        name: String,
        /// Whether the property was marked `?`.
        optional: bool,
        /// Property type.
        ty: TypeExpr,
        /// Position of the name.
        position: Position,
    },
    /// `[key: string]: T`
    Index {
        /// Value type.
        value: TypeExpr,
        /// Position of the opening bracket.
        position: Position,
    },
}

/// Shape annotations.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// `@minLength(n)`
    MinLength(usize),
    /// `@maxLength(n)`
    MaxLength(usize),
    /// `@minimum(n)`
    Minimum(f64),
    /// `@maximum(n)`
    Maximum(f64),
    /// `@pattern("re")`
    Pattern(String),
    /// `@description("text")`
    Description(String),
    /// `@integer`
    Integer,
    /// `@uniqueItems`
    UniqueItems,
    /// `@minItems(n)`
    MinItems(usize),
    /// `@maxItems(n)`
    MaxItems(usize),
}

impl Annotation {
    /// Returns the annotation's source name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MinLength(_) => "minLength",
            Self::MaxLength(_) => "maxLength",
            Self::Minimum(_) => "minimum",
            Self::Maximum(_) => "maximum",
            Self::Pattern(_) => "pattern",
            Self::Description(_) => "description",
            Self::Integer => "integer",
            Self::UniqueItems => "uniqueItems",
            Self::MinItems(_) => "minItems",
            Self::MaxItems(_) => "maxItems",
        }
    }
}

/// An annotation with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedAnnotation {
    /// The annotation.
    pub annotation: Annotation,
    /// Position of the `@`.
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_locate() {
        let input = "type A = string;\ntype B = {\n  x: number\n};";
        assert_eq!(Position::locate(input, 0), Position { line: 1, column: 1 });
        let offset = input.find('x').unwrap();
        assert_eq!(Position::locate(input, offset), Position { line: 3, column: 3 });
    }

    #[test]
    fn test_literal_to_json() {
        assert_eq!(LiteralValue::Number(1.0).to_json(), json!(1));
        assert_eq!(LiteralValue::Number(1.5).to_json(), json!(1.5));
        assert_eq!(LiteralValue::String("GET".into()).to_json(), json!("GET"));
        assert_eq!(LiteralValue::Boolean(false).to_json(), json!(false));
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(KeywordType::from_ident("unknown"), Some(KeywordType::Unknown));
        assert_eq!(KeywordType::from_ident("String"), None);
    }
}
