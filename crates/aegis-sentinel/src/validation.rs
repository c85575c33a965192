//! Shape validation against compiled schema documents.
//!
//! Validation walks the value and the shape together, depth-first. Object
//! properties are visited in declaration order, then unknown keys in the
//! order they appear in the value. Each failure is recorded with a dot path
//! from the validated root, so the error list reads in the order a person
//! scanning the request would find the problems. Keys are joined as written,
//! without escaping.

use std::collections::HashMap;

use aegis_core::{value_type_name, Constraints, PrimitiveKind, SchemaDocument, ShapeNode};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::error::{SentinelError, SentinelResult, ValidationError};
use crate::rejection::RequestRejection;

/// Message of the single error reported for a disallowed method.
pub const METHOD_NOT_ALLOWED: &str = "method not allowed";

/// Result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether validation passed.
    pub valid: bool,
    /// Errors in discovery order. Empty when `valid`.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a successful validation result.
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: vec![],
        }
    }

    /// Create a result from collected errors; valid when there are none.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Create the result for a method outside the allowed set.
    pub fn method_not_allowed() -> Self {
        Self {
            valid: false,
            errors: vec![ValidationError::new("method", METHOD_NOT_ALLOWED)],
        }
    }

    /// Check if any errors exist.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the request was stopped at the method gate.
    pub fn is_method_not_allowed(&self) -> bool {
        !self.valid
            && matches!(
                self.errors.as_slice(),
                [error] if error.pointer == "method" && error.message == METHOD_NOT_ALLOWED
            )
    }

    /// Label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        if self.valid {
            "valid"
        } else if self.is_method_not_allowed() {
            "method_not_allowed"
        } else {
            "shape_violation"
        }
    }

    /// Maps a failed result to the client-error response it should produce.
    pub fn rejection(&self) -> Option<RequestRejection> {
        if self.valid {
            None
        } else if self.is_method_not_allowed() {
            Some(RequestRejection::MethodNotAllowed {
                errors: self.errors.clone(),
            })
        } else {
            Some(RequestRejection::ShapeViolation {
                errors: self.errors.clone(),
            })
        }
    }
}

/// Validates values against one schema document.
///
/// Construction checks document integrity and compiles every pattern once;
/// validation itself never fails, it only collects errors.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    document: SchemaDocument,
    patterns: HashMap<String, Regex>,
    config: ValidationConfig,
}

impl SchemaValidator {
    /// Create a validator for `document`, which belongs to `endpoint`.
    pub fn new(
        endpoint: &str,
        document: SchemaDocument,
        config: ValidationConfig,
    ) -> SentinelResult<Self> {
        document
            .check_integrity()
            .map_err(|source| SentinelError::InvalidArtifact {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let mut patterns = HashMap::new();
        for shape in document.definitions.values() {
            let mut found = Vec::new();
            collect_patterns(shape, &mut found);
            for pattern in found {
                if patterns.contains_key(pattern) {
                    continue;
                }
                let regex = Regex::new(pattern).map_err(|e| SentinelError::InvalidPattern {
                    endpoint: endpoint.to_string(),
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
                patterns.insert(pattern.to_string(), regex);
            }
        }

        debug!(
            endpoint,
            root = %document.root,
            definitions = document.definitions.len(),
            patterns = patterns.len(),
            "schema validator initialized"
        );

        Ok(Self {
            document,
            patterns,
            config,
        })
    }

    /// The document being validated against.
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Validate a value against the document root.
    pub fn validate(&self, value: &Value) -> Vec<ValidationError> {
        let mut errors = Errors::new(self.config.max_errors);
        if let Some(root) = self.document.root_shape() {
            self.check(root, value, "", 0, &mut errors);
        }
        errors.into_vec()
    }

    /// Whether a value passes, without collecting more than one error.
    pub fn is_valid(&self, value: &Value) -> bool {
        let mut errors = Errors::new(1);
        if let Some(root) = self.document.root_shape() {
            self.check(root, value, "", 0, &mut errors);
        }
        errors.is_empty()
    }

    fn check(
        &self,
        shape: &ShapeNode,
        value: &Value,
        pointer: &str,
        depth: usize,
        errors: &mut Errors,
    ) {
        if errors.is_full() {
            return;
        }
        if depth > self.config.max_depth {
            errors.push(
                pointer,
                format!("exceeds maximum depth {}", self.config.max_depth),
            );
            return;
        }

        match shape {
            ShapeNode::Any => {}
            ShapeNode::Reference { name } => match self.document.definitions.get(name) {
                Some(target) => self.check(target, value, pointer, depth + 1, errors),
                None => errors.push(pointer, format!("unresolved reference {name}")),
            },
            ShapeNode::Primitive { kind, constraints } => {
                self.check_primitive(*kind, constraints, value, pointer, errors);
            }
            ShapeNode::Object {
                properties,
                required,
                additional_allowed,
                additional,
            } => self.check_object(
                ObjectShape {
                    properties,
                    required,
                    additional_allowed: *additional_allowed,
                    additional: additional.as_deref(),
                },
                value,
                pointer,
                depth,
                errors,
            ),
            ShapeNode::Array {
                element,
                unique_items,
                min_items,
                max_items,
            } => {
                let Value::Array(items) = value else {
                    errors.push(pointer, type_mismatch("array", value));
                    return;
                };
                if let Some(min) = min_items {
                    if items.len() < *min {
                        errors.push(pointer, format!("expected at least {min} items"));
                    }
                }
                if let Some(max) = max_items {
                    if items.len() > *max {
                        errors.push(pointer, format!("expected at most {max} items"));
                    }
                }
                for (index, item) in items.iter().enumerate() {
                    let child = join(pointer, &index.to_string());
                    self.check(element, item, &child, depth + 1, errors);
                }
                if *unique_items {
                    for index in 1..items.len() {
                        if let Some(first) =
                            (0..index).find(|&earlier| values_equal(&items[earlier], &items[index]))
                        {
                            errors.push(
                                &join(pointer, &index.to_string()),
                                format!("duplicate of item {first}"),
                            );
                        }
                    }
                }
            }
            ShapeNode::Union { variants } => {
                self.check_union(variants, value, pointer, depth, errors);
            }
        }
    }

    /// Checks each viable variant once and stops at the first that passes.
    ///
    /// Variants of the wrong JSON type, and object variants whose literal
    /// property disagrees with the value, cannot pass and are not walked.
    /// When nothing passes, the errors of the first viable variant are kept,
    /// preferring one whose literal property matches the value.
    fn check_union(
        &self,
        variants: &[ShapeNode],
        value: &Value,
        pointer: &str,
        depth: usize,
        errors: &mut Errors,
    ) {
        let mut matched = Vec::new();
        let mut neutral = Vec::new();
        let mut conflicting = Vec::new();
        for variant in variants.iter().filter(|variant| self.compatible(variant, value)) {
            match self.discriminant(variant, value) {
                Discriminant::Matches => matched.push(variant),
                Discriminant::Neutral => neutral.push(variant),
                Discriminant::Conflicts => conflicting.push(variant),
            }
        }

        let mut reported: Option<Errors> = None;
        for variant in matched.into_iter().chain(neutral) {
            let mut trial = Errors::new(errors.remaining());
            self.check(variant, value, pointer, depth, &mut trial);
            if trial.is_empty() {
                return;
            }
            if reported.is_none() {
                reported = Some(trial);
            }
        }

        match (reported, conflicting.first()) {
            (Some(trial), _) => errors.extend(trial),
            (None, Some(variant)) => self.check(variant, value, pointer, depth, errors),
            (None, None) => errors.push(pointer, "does not match any variant"),
        }
    }

    fn check_primitive(
        &self,
        kind: PrimitiveKind,
        constraints: &Constraints,
        value: &Value,
        pointer: &str,
        errors: &mut Errors,
    ) {
        if !kind.accepts(value) {
            errors.push(pointer, type_mismatch(kind.as_str(), value));
            return;
        }

        if let Some(allowed) = &constraints.enum_values {
            if !allowed.iter().any(|candidate| values_equal(candidate, value)) {
                let message = match allowed.as_slice() {
                    [single] => format!("must equal {single}"),
                    _ => format!(
                        "must be one of {}",
                        allowed
                            .iter()
                            .map(Value::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                };
                errors.push(pointer, message);
            }
        }

        if let Value::String(text) = value {
            let length = text.chars().count();
            if let Some(min) = constraints.min_length {
                if length < min {
                    errors.push(pointer, format!("below minimum length {min}"));
                }
            }
            if let Some(max) = constraints.max_length {
                if length > max {
                    errors.push(pointer, format!("above maximum length {max}"));
                }
            }
            if let Some(pattern) = &constraints.pattern {
                if let Some(regex) = self.patterns.get(pattern) {
                    if !regex.is_match(text) {
                        errors.push(pointer, format!("does not match pattern {pattern}"));
                    }
                }
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = constraints.minimum {
                if number < min {
                    errors.push(pointer, format!("below minimum {min}"));
                }
            }
            if let Some(max) = constraints.maximum {
                if number > max {
                    errors.push(pointer, format!("above maximum {max}"));
                }
            }
        }
    }

    fn check_object(
        &self,
        shape: ObjectShape<'_>,
        value: &Value,
        pointer: &str,
        depth: usize,
        errors: &mut Errors,
    ) {
        let Value::Object(map) = value else {
            errors.push(pointer, type_mismatch("object", value));
            return;
        };

        for (key, property) in shape.properties {
            let child = join(pointer, key);
            match map.get(key) {
                Some(present) => self.check(property, present, &child, depth + 1, errors),
                None if shape.required.contains(key) => {
                    errors.push(&child, "missing required property");
                }
                None => {}
            }
        }

        for (key, extra) in map {
            if shape.properties.contains_key(key) {
                continue;
            }
            let child = join(pointer, key);
            if !shape.additional_allowed {
                errors.push(&child, "unknown property");
            } else if let Some(additional) = shape.additional {
                self.check(additional, extra, &child, depth + 1, errors);
            }
        }
    }

    /// How an object variant's literal properties relate to the value.
    fn discriminant(&self, shape: &ShapeNode, value: &Value) -> Discriminant {
        let (ShapeNode::Object { properties, .. }, Value::Object(map)) =
            (self.document.resolve(shape), value)
        else {
            return Discriminant::Neutral;
        };

        let mut result = Discriminant::Neutral;
        for (key, property) in properties {
            let literal = self.document.resolve(property).literal_value();
            if let (Some(literal), Some(actual)) = (literal, map.get(key)) {
                if !values_equal(literal, actual) {
                    return Discriminant::Conflicts;
                }
                result = Discriminant::Matches;
            }
        }
        result
    }

    fn compatible(&self, shape: &ShapeNode, value: &Value) -> bool {
        match self.document.resolve(shape) {
            ShapeNode::Primitive { kind, .. } => kind.accepts(value),
            ShapeNode::Object { .. } => value.is_object(),
            ShapeNode::Array { .. } => value.is_array(),
            ShapeNode::Union { variants } => {
                variants.iter().any(|variant| self.compatible(variant, value))
            }
            ShapeNode::Any => true,
            ShapeNode::Reference { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discriminant {
    Matches,
    Neutral,
    Conflicts,
}

/// Borrowed view of an object shape's fields.
struct ObjectShape<'s> {
    properties: &'s IndexMap<String, ShapeNode>,
    required: &'s IndexSet<String>,
    additional_allowed: bool,
    additional: Option<&'s ShapeNode>,
}

/// Bounded error collector.
struct Errors {
    items: Vec<ValidationError>,
    limit: usize,
}

impl Errors {
    fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, pointer: &str, message: impl Into<String>) {
        if !self.is_full() {
            self.items.push(ValidationError::new(pointer, message));
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.items.len())
    }

    fn extend(&mut self, other: Errors) {
        for error in other.items {
            if self.is_full() {
                break;
            }
            self.items.push(error);
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn into_vec(self) -> Vec<ValidationError> {
        self.items
    }
}

/// Appends a property name or array index to a dot path.
///
/// Keys are not escaped, so a property literally named `a.b` and a nested
/// `a` then `b` produce the same pointer. Pointers locate errors for people
/// reading a rejection; they are not meant to be parsed back into a path.
fn join(pointer: &str, key: &str) -> String {
    if pointer.is_empty() {
        key.to_string()
    } else {
        format!("{pointer}.{key}")
    }
}

fn type_mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {}", value_type_name(value))
}

/// Structural equality with numbers compared by value, so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn collect_patterns<'s>(shape: &'s ShapeNode, out: &mut Vec<&'s str>) {
    match shape {
        ShapeNode::Primitive { constraints, .. } => {
            if let Some(pattern) = &constraints.pattern {
                out.push(pattern);
            }
        }
        ShapeNode::Object {
            properties,
            additional,
            ..
        } => {
            for property in properties.values() {
                collect_patterns(property, out);
            }
            if let Some(additional) = additional {
                collect_patterns(additional, out);
            }
        }
        ShapeNode::Array { element, .. } => collect_patterns(element, out),
        ShapeNode::Union { variants } => {
            for variant in variants {
                collect_patterns(variant, out);
            }
        }
        ShapeNode::Reference { .. } | ShapeNode::Any => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(root: ShapeNode) -> SchemaValidator {
        validator_with(root, vec![], ValidationConfig::default())
    }

    fn validator_with(
        root: ShapeNode,
        definitions: Vec<(&str, ShapeNode)>,
        config: ValidationConfig,
    ) -> SchemaValidator {
        let mut table = IndexMap::new();
        table.insert("Root".to_string(), root);
        for (name, shape) in definitions {
            table.insert(name.to_string(), shape);
        }
        SchemaValidator::new("test", SchemaDocument::new("Root", table), config).unwrap()
    }

    fn pointers(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.pointer.as_str()).collect()
    }

    // ==================== Primitive Tests ====================

    #[test]
    fn test_type_mismatch_message() {
        let errors = validator(ShapeNode::string()).validate(&json!(5));
        assert_eq!(errors, vec![ValidationError::new("", "expected string, got number")]);
    }

    #[test]
    fn test_string_length_bounds() {
        let v = validator(ShapeNode::string().min_length(1).max_length(3));
        assert_eq!(v.validate(&json!(""))[0].message, "below minimum length 1");
        assert_eq!(v.validate(&json!("abcd"))[0].message, "above maximum length 3");
        assert!(v.validate(&json!("hé")).is_empty());
    }

    #[test]
    fn test_numeric_bounds_and_integer() {
        let v = validator(ShapeNode::integer().minimum(1.0).maximum(10.0));
        assert_eq!(v.validate(&json!(0))[0].message, "below minimum 1");
        assert_eq!(v.validate(&json!(11))[0].message, "above maximum 10");
        assert_eq!(
            v.validate(&json!(1.5))[0].message,
            "expected integer, got number"
        );
        assert!(v.validate(&json!(4.0)).is_empty());
    }

    #[test]
    fn test_pattern() {
        let v = validator(ShapeNode::string().pattern("^[a-z]+$"));
        assert!(v.validate(&json!("abc")).is_empty());
        assert_eq!(
            v.validate(&json!("ABC"))[0].message,
            "does not match pattern ^[a-z]+$"
        );
    }

    #[test]
    fn test_invalid_pattern_rejected_at_construction() {
        let mut table = IndexMap::new();
        table.insert("Root".to_string(), ShapeNode::string().pattern("("));
        let err = SchemaValidator::new(
            "x",
            SchemaDocument::new("Root", table),
            ValidationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SentinelError::InvalidPattern { .. }));
    }

    #[test]
    fn test_enum_messages() {
        assert_eq!(
            validator(ShapeNode::literal("PATCH")).validate(&json!("PUT"))[0].message,
            "must equal \"PATCH\""
        );
        assert_eq!(
            validator(ShapeNode::string_enum(["a", "b"])).validate(&json!("c"))[0].message,
            "must be one of \"a\", \"b\""
        );
        assert!(validator(ShapeNode::literal(1)).validate(&json!(1.0)).is_empty());
    }

    // ==================== Object Tests ====================

    #[test]
    fn test_closed_object_rejects_unknown_key() {
        let v = validator(ShapeNode::object().property("a", ShapeNode::number()).build());
        assert_eq!(
            v.validate(&json!({"a": 1, "b": 2})),
            vec![ValidationError::new("b", "unknown property")]
        );
    }

    #[test]
    fn test_missing_required_and_declaration_order() {
        let v = validator(
            ShapeNode::object()
                .property("first", ShapeNode::string())
                .property("second", ShapeNode::string())
                .optional("third", ShapeNode::string())
                .build(),
        );
        let errors = v.validate(&json!({"extra": true, "second": 2}));
        assert_eq!(pointers(&errors), vec!["first", "second", "extra"]);
        assert_eq!(errors[0].message, "missing required property");
        assert_eq!(errors[1].message, "expected string, got number");
    }

    #[test]
    fn test_open_object_checks_additional_values() {
        let v = validator(ShapeNode::object().additional(ShapeNode::integer()).build());
        assert!(v.validate(&json!({"x": 1, "y": 2})).is_empty());
        assert_eq!(pointers(&v.validate(&json!({"x": 1, "y": "2"}))), vec!["y"]);

        let open = validator(ShapeNode::object().open().build());
        assert!(open.validate(&json!({"anything": [1, 2]})).is_empty());
    }

    #[test]
    fn test_dotted_key_pointer_is_unescaped() {
        let v = validator(
            ShapeNode::object()
                .property("a.b", ShapeNode::string())
                .build(),
        );
        assert_eq!(
            v.validate(&json!({"a.b": 1})),
            vec![ValidationError::new("a.b", "expected string, got number")]
        );
    }

    // ==================== Array Tests ====================

    #[test]
    fn test_array_elements_and_pointers() {
        let v = validator(ShapeNode::array(
            ShapeNode::object().property("title", ShapeNode::string()).build(),
        ));
        let errors = v.validate(&json!([{"title": "a"}, {"title": 1}]));
        assert_eq!(pointers(&errors), vec!["1.title"]);
    }

    #[test]
    fn test_unique_items_structural() {
        let v = validator(ShapeNode::array(ShapeNode::any()).unique_items());
        let errors = v.validate(&json!([{"a": [1]}, 2, {"a": [1.0]}]));
        assert_eq!(errors, vec![ValidationError::new("2", "duplicate of item 0")]);
    }

    #[test]
    fn test_item_count_bounds() {
        let v = validator(ShapeNode::array(ShapeNode::number()).min_items(1).max_items(2));
        assert_eq!(v.validate(&json!([]))[0].message, "expected at least 1 items");
        assert_eq!(v.validate(&json!([1, 2, 3]))[0].message, "expected at most 2 items");
    }

    // ==================== Union Tests ====================

    #[test]
    fn test_union_any_variant_passes() {
        let v = validator(ShapeNode::union(vec![ShapeNode::string(), ShapeNode::null()]));
        assert!(v.validate(&json!(null)).is_empty());
        assert!(v.validate(&json!("x")).is_empty());
    }

    #[test]
    fn test_union_reports_discriminated_branch() {
        let v = validator(ShapeNode::union(vec![
            ShapeNode::object()
                .property("kind", ShapeNode::literal("a"))
                .property("x", ShapeNode::number())
                .build(),
            ShapeNode::object()
                .property("kind", ShapeNode::literal("b"))
                .property("y", ShapeNode::string())
                .build(),
        ]));
        let errors = v.validate(&json!({"kind": "b", "y": 3}));
        assert_eq!(errors, vec![ValidationError::new("y", "expected string, got number")]);
    }

    #[test]
    fn test_union_falls_back_to_compatible_type() {
        let v = validator(ShapeNode::union(vec![
            ShapeNode::string().min_length(3),
            ShapeNode::number(),
        ]));
        assert_eq!(v.validate(&json!("ab"))[0].message, "below minimum length 3");
        assert_eq!(
            v.validate(&json!(true)),
            vec![ValidationError::new("", "does not match any variant")]
        );
    }

    // ==================== Recursion and Limit Tests ====================

    #[test]
    fn test_recursive_reference() {
        let node = ShapeNode::object()
            .optional("name", ShapeNode::string())
            .optional("child", ShapeNode::reference("Node"))
            .build();
        let v = validator_with(
            ShapeNode::reference("Node"),
            vec![("Node", node)],
            ValidationConfig::default(),
        );
        let value = json!({"child": {"child": {"child": {"name": 7}}}});
        assert_eq!(pointers(&v.validate(&value)), vec!["child.child.child.name"]);
    }

    #[test]
    fn test_deep_recursive_union_is_linear() {
        let node = ShapeNode::object()
            .optional("name", ShapeNode::string())
            .optional(
                "child",
                ShapeNode::union(vec![ShapeNode::reference("Node"), ShapeNode::null()]),
            )
            .build();
        let v = validator_with(
            ShapeNode::reference("Node"),
            vec![("Node", node)],
            ValidationConfig::default(),
        );

        let levels = 40;
        let mut value = json!({"name": 5});
        for _ in 0..levels {
            value = json!({ "child": value });
        }
        let expected = format!("{}name", "child.".repeat(levels));

        let started = std::time::Instant::now();
        let errors = v.validate(&value);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(
            errors,
            vec![ValidationError::new(&expected, "expected string, got number")]
        );

        let mut valid = json!({"name": "leaf", "child": null});
        for _ in 0..levels {
            valid = json!({ "child": valid });
        }
        assert!(v.is_valid(&valid));
    }

    #[test]
    fn test_union_conflicting_discriminator_reported() {
        let v = validator(ShapeNode::union(vec![
            ShapeNode::object()
                .property("kind", ShapeNode::literal("a"))
                .build(),
            ShapeNode::object()
                .property("kind", ShapeNode::literal("b"))
                .build(),
        ]));
        assert_eq!(
            v.validate(&json!({"kind": "c"})),
            vec![ValidationError::new("kind", "must equal \"a\"")]
        );
    }

    #[test]
    fn test_max_depth_guard() {
        let node = ShapeNode::object()
            .optional("child", ShapeNode::reference("Node"))
            .build();
        let v = validator_with(
            ShapeNode::reference("Node"),
            vec![("Node", node)],
            ValidationConfig::default().with_max_depth(4),
        );
        let value = json!({"child": {"child": {"child": {"child": {}}}}});
        let errors = v.validate(&value);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "exceeds maximum depth 4");
    }

    #[test]
    fn test_max_errors_cap() {
        let v = validator_with(
            ShapeNode::object().build(),
            vec![],
            ValidationConfig::default().with_max_errors(2),
        );
        let errors = v.validate(&json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(pointers(&errors), vec!["a", "b"]);
    }

    // ==================== Result Tests ====================

    #[test]
    fn test_result_outcomes() {
        assert_eq!(ValidationResult::success().outcome(), "valid");
        assert!(ValidationResult::success().rejection().is_none());

        let gated = ValidationResult::method_not_allowed();
        assert!(gated.is_method_not_allowed());
        assert_eq!(gated.outcome(), "method_not_allowed");

        let shape = ValidationResult::from_errors(vec![ValidationError::new("b", "unknown property")]);
        assert!(!shape.valid);
        assert_eq!(shape.outcome(), "shape_violation");
    }

    #[test]
    fn test_result_serializes_as_valid_and_errors() {
        let result = ValidationResult::method_not_allowed();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"valid": false, "errors": [{"pointer": "method", "message": "method not allowed"}]})
        );
    }
}
