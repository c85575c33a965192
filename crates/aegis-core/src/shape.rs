//! Shape model.
//!
//! A [`ShapeNode`] describes the set of JSON values a request slot may hold.
//! Shapes are plain trees; recursion is expressed through
//! [`ShapeNode::Reference`] nodes that name an entry in a definitions table
//! owned by a [`ContractDescriptor`](crate::ContractDescriptor) or a
//! [`SchemaDocument`](crate::SchemaDocument).
//!
//! # Example
//!
//! ```
//! use aegis_core::ShapeNode;
//!
//! let body = ShapeNode::object()
//!     .property("content", ShapeNode::string().min_length(1).max_length(20_000))
//!     .build();
//!
//! assert_eq!(body.kind_name(), "object");
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive JSON value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// JSON string.
    String,
    /// Any JSON number.
    Number,
    /// JSON number without a fractional part.
    Integer,
    /// JSON boolean.
    Boolean,
    /// JSON null.
    Null,
}

impl PrimitiveKind {
    /// Returns the lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }

    /// Returns whether a JSON value carries this kind's type tag.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value
                        .as_f64()
                        .is_some_and(|n| n.is_finite() && n.fract() == 0.0)
            }
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
        }
    }
}

/// Constraints attached to a primitive shape.
///
/// Every field is optional; an empty set of constraints accepts any value of
/// the primitive's kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Minimum string length, counted in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum string length, counted in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Inclusive numeric lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive numeric upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Regular expression the string must match (unanchored).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Closed set of allowed values. A single entry models a literal.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Human-readable description. Carried through, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Constraints {
    /// Returns true when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.pattern.is_none()
            && self.enum_values.is_none()
            && self.description.is_none()
    }
}

/// A recursive description of permissible values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeNode {
    /// A primitive value with optional constraints.
    Primitive {
        /// Type tag.
        kind: PrimitiveKind,
        /// Constraints on the value.
        #[serde(default, skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    /// An object with named properties.
    Object {
        /// Declared properties in declaration order.
        #[serde(default)]
        properties: IndexMap<String, ShapeNode>,
        /// Names of properties that must be present.
        #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
        required: IndexSet<String>,
        /// Whether keys outside `properties` are accepted.
        additional_allowed: bool,
        /// Shape every additional value must satisfy, when the object is open.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional: Option<Box<ShapeNode>>,
    },
    /// A homogeneous array.
    Array {
        /// Shape of every element.
        element: Box<ShapeNode>,
        /// Whether elements must be pairwise distinct.
        #[serde(default, skip_serializing_if = "is_false")]
        unique_items: bool,
        /// Minimum number of elements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of elements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// Matches when any variant matches.
    Union {
        /// Variants in declaration order.
        variants: Vec<ShapeNode>,
    },
    /// Points into a definitions table.
    Reference {
        /// Definition name.
        name: String,
    },
    /// Accepts every value.
    Any,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl ShapeNode {
    /// Creates an unconstrained primitive shape.
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive {
            kind,
            constraints: Constraints::default(),
        }
    }

    /// Creates a string shape.
    #[must_use]
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    /// Creates a number shape.
    #[must_use]
    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number)
    }

    /// Creates an integer shape.
    #[must_use]
    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }

    /// Creates a boolean shape.
    #[must_use]
    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    /// Creates a null shape.
    #[must_use]
    pub fn null() -> Self {
        Self::primitive(PrimitiveKind::Null)
    }

    /// Creates a single-value shape for a literal.
    ///
    /// Strings, numbers and booleans become a primitive of the matching kind
    /// with a one-entry enumeration. `null` becomes the null shape.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let kind = match &value {
            Value::Null => return Self::null(),
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::Number(_) => PrimitiveKind::Number,
            _ => PrimitiveKind::String,
        };
        Self::Primitive {
            kind,
            constraints: Constraints {
                enum_values: Some(vec![value]),
                ..Constraints::default()
            },
        }
    }

    /// Creates a string shape restricted to the given values, in order.
    #[must_use]
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Primitive {
            kind: PrimitiveKind::String,
            constraints: Constraints {
                enum_values: Some(
                    values
                        .into_iter()
                        .map(|v| Value::String(v.into()))
                        .collect(),
                ),
                ..Constraints::default()
            },
        }
    }

    /// Creates an array shape.
    #[must_use]
    pub fn array(element: ShapeNode) -> Self {
        Self::Array {
            element: Box::new(element),
            unique_items: false,
            min_items: None,
            max_items: None,
        }
    }

    /// Creates a union shape.
    #[must_use]
    pub fn union(variants: Vec<ShapeNode>) -> Self {
        Self::Union { variants }
    }

    /// Creates a reference to a named definition.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference { name: name.into() }
    }

    /// Creates a shape that accepts anything.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Starts building a closed object shape.
    #[must_use]
    pub fn object() -> ObjectShapeBuilder {
        ObjectShapeBuilder::default()
    }

    /// Sets a minimum string length. No effect on non-primitive shapes.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        self.with_constraints(|c| c.min_length = Some(len))
    }

    /// Sets a maximum string length. No effect on non-primitive shapes.
    #[must_use]
    pub fn max_length(self, len: usize) -> Self {
        self.with_constraints(|c| c.max_length = Some(len))
    }

    /// Sets an inclusive lower bound. No effect on non-primitive shapes.
    #[must_use]
    pub fn minimum(self, min: f64) -> Self {
        self.with_constraints(|c| c.minimum = Some(min))
    }

    /// Sets an inclusive upper bound. No effect on non-primitive shapes.
    #[must_use]
    pub fn maximum(self, max: f64) -> Self {
        self.with_constraints(|c| c.maximum = Some(max))
    }

    /// Sets a pattern. No effect on non-primitive shapes.
    #[must_use]
    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.with_constraints(|c| c.pattern = Some(pattern))
    }

    /// Sets a description. No effect on non-primitive shapes.
    #[must_use]
    pub fn description(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_constraints(|c| c.description = Some(text))
    }

    /// Requires array elements to be pairwise distinct.
    #[must_use]
    pub fn unique_items(mut self) -> Self {
        if let Self::Array { unique_items, .. } = &mut self {
            *unique_items = true;
        }
        self
    }

    /// Sets a minimum array length.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets a maximum array length.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    fn with_constraints(mut self, apply: impl FnOnce(&mut Constraints)) -> Self {
        if let Self::Primitive { constraints, .. } = &mut self {
            apply(constraints);
        }
        self
    }

    /// Returns a short name for the node's variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive { kind, .. } => kind.as_str(),
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Union { .. } => "union",
            Self::Reference { .. } => "reference",
            Self::Any => "any",
        }
    }

    /// Returns the enumerated values when this is an enumerated primitive.
    pub fn enum_values(&self) -> Option<&[Value]> {
        match self {
            Self::Primitive { constraints, .. } => constraints.enum_values.as_deref(),
            _ => None,
        }
    }

    /// Returns the single literal value when this shape is a literal.
    pub fn literal_value(&self) -> Option<&Value> {
        match self.enum_values() {
            Some([value]) => Some(value),
            _ => None,
        }
    }

    /// Calls `visit` with every reference name in this tree, depth-first in
    /// declaration order.
    pub fn visit_references<F>(&self, visit: &mut F)
    where
        F: FnMut(&str),
    {
        match self {
            Self::Reference { name } => visit(name),
            Self::Object {
                properties,
                additional,
                ..
            } => {
                for shape in properties.values() {
                    shape.visit_references(visit);
                }
                if let Some(additional) = additional {
                    additional.visit_references(visit);
                }
            }
            Self::Array { element, .. } => element.visit_references(visit),
            Self::Union { variants } => {
                for variant in variants {
                    variant.visit_references(visit);
                }
            }
            Self::Primitive { .. } | Self::Any => {}
        }
    }

    /// Returns every reference name in this tree.
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit_references(&mut |name| names.push(name.to_string()));
        names
    }
}

/// Builder for [`ShapeNode::Object`].
#[derive(Debug, Clone, Default)]
pub struct ObjectShapeBuilder {
    properties: IndexMap<String, ShapeNode>,
    required: IndexSet<String>,
    additional_allowed: bool,
    additional: Option<Box<ShapeNode>>,
}

impl ObjectShapeBuilder {
    /// Adds a required property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, shape: ShapeNode) -> Self {
        let name = name.into();
        self.required.insert(name.clone());
        self.properties.insert(name, shape);
        self
    }

    /// Adds an optional property.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, shape: ShapeNode) -> Self {
        let name = name.into();
        self.required.shift_remove(&name);
        self.properties.insert(name, shape);
        self
    }

    /// Accepts keys outside the declared properties.
    #[must_use]
    pub fn open(mut self) -> Self {
        self.additional_allowed = true;
        self
    }

    /// Accepts additional keys whose values satisfy `shape`.
    #[must_use]
    pub fn additional(mut self, shape: ShapeNode) -> Self {
        self.additional_allowed = true;
        self.additional = Some(Box::new(shape));
        self
    }

    /// Builds the object shape.
    #[must_use]
    pub fn build(self) -> ShapeNode {
        ShapeNode::Object {
            properties: self.properties,
            required: self.required,
            additional_allowed: self.additional_allowed,
            additional: self.additional,
        }
    }
}

/// Returns a human-readable name for a JSON value type.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
