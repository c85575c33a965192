//! Lowering of type expressions into shapes.
//!
//! Named declarations become entries in a definitions table and are referred
//! to by [`ShapeNode::Reference`]. A definition is reserved before its body is
//! lowered, so self-referential types terminate by pointing back at the
//! reserved name instead of expanding again.
//!
//! `Partial<T>` is lowered in [`Mode::Partial`]: every object member becomes
//! optional and every named type reached from `T` is instantiated once under
//! the name `Partial<Name>`.

use std::collections::HashSet;

use aegis_core::{Constraints, PrimitiveKind, ShapeNode};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::ast::{
    Annotation, KeywordType, LiteralValue, ObjectMember, Position, SpannedAnnotation,
    TypeDeclaration, TypeExpr,
};
use crate::env::TypeEnv;
use crate::error::TypeError;

/// Maximum number of object variants an intersection may expand to.
pub const MAX_INTERSECTION_VARIANTS: usize = 256;

/// How object members are treated while lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Members keep their declared optionality.
    Exact,
    /// Every member is optional, recursively.
    Partial,
}

impl Mode {
    fn definition_name(self, name: &str) -> String {
        match self {
            Self::Exact => name.to_string(),
            Self::Partial => format!("Partial<{name}>"),
        }
    }
}

/// Lowers type expressions against a shared and a local environment.
pub(crate) struct Lowerer<'e> {
    shared: &'e TypeEnv,
    local: &'e TypeEnv,
    definitions: IndexMap<String, ShapeNode>,
    pending: HashSet<String>,
    aliasing: Vec<String>,
}

impl<'e> Lowerer<'e> {
    /// Creates a lowerer. Local declarations may not shadow shared ones.
    pub(crate) fn new(shared: &'e TypeEnv, local: &'e TypeEnv) -> Result<Self, TypeError> {
        if let Some(clash) = local.iter().find(|d| shared.contains(&d.name)) {
            return Err(TypeError::DuplicateType {
                name: clash.name.clone(),
                position: clash.position,
            });
        }
        Ok(Self {
            shared,
            local,
            definitions: IndexMap::new(),
            pending: HashSet::new(),
            aliasing: Vec::new(),
        })
    }

    /// Consumes the lowerer, returning the definitions in first-use order.
    pub(crate) fn into_definitions(self) -> IndexMap<String, ShapeNode> {
        self.definitions
    }

    fn lookup(&self, name: &str) -> Option<&'e TypeDeclaration> {
        self.local.get(name).or_else(|| self.shared.get(name))
    }

    /// Lowers an expression. Named types become references.
    pub(crate) fn lower(&mut self, expr: &TypeExpr, mode: Mode) -> Result<ShapeNode, TypeError> {
        match expr {
            TypeExpr::Keyword(keyword) => Ok(keyword_shape(*keyword)),
            TypeExpr::Literal(literal) => Ok(ShapeNode::literal(literal.to_json())),
            TypeExpr::Object(members) => self.lower_object(members, mode),
            TypeExpr::Array(element) => Ok(ShapeNode::array(self.lower(element, mode)?)),
            TypeExpr::Union(variants) => self.lower_union(variants, mode),
            TypeExpr::Intersection(parts) => self.lower_intersection(parts, mode),
            TypeExpr::Named {
                name,
                args,
                position,
            } => self.lower_named(name, args, *position, mode),
            TypeExpr::Annotated { inner, annotations } => {
                let shape = self.inline(inner, mode)?;
                annotations
                    .iter()
                    .try_fold(shape, |shape, annotation| apply_annotation(shape, annotation))
            }
        }
    }

    /// Lowers an expression and replaces a top-level reference with the
    /// structure it names.
    pub(crate) fn inline(&mut self, expr: &TypeExpr, mode: Mode) -> Result<ShapeNode, TypeError> {
        let shape = self.lower(expr, mode)?;
        self.resolve(shape)
    }

    /// Follows references until a structural shape is reached.
    pub(crate) fn resolve(&self, mut shape: ShapeNode) -> Result<ShapeNode, TypeError> {
        let mut hops = 0;
        while let ShapeNode::Reference { name } = &shape {
            if self.pending.contains(name) || hops > self.definitions.len() {
                return Err(TypeError::CircularAlias { name: name.clone() });
            }
            shape = self
                .definitions
                .get(name)
                .cloned()
                .ok_or_else(|| TypeError::CircularAlias { name: name.clone() })?;
            hops += 1;
        }
        Ok(shape)
    }

    fn lower_named(
        &mut self,
        name: &str,
        args: &[TypeExpr],
        position: Position,
        mode: Mode,
    ) -> Result<ShapeNode, TypeError> {
        if let Some(declaration) = self.lookup(name) {
            expect_arity(name, args, 0, position)?;
            return self.lower_declared(declaration, mode);
        }

        match name {
            "Partial" => {
                expect_arity(name, args, 1, position)?;
                self.lower(&args[0], Mode::Partial)
            }
            "Array" => {
                expect_arity(name, args, 1, position)?;
                Ok(ShapeNode::array(self.lower(&args[0], mode)?))
            }
            "Record" => {
                expect_arity(name, args, 2, position)?;
                if args[0] != TypeExpr::Keyword(KeywordType::String) {
                    return Err(TypeError::InvalidGenericArgument {
                        name: name.to_string(),
                        reason: "the key type must be `string`".to_string(),
                        position,
                    });
                }
                let value = self.lower(&args[1], mode)?;
                Ok(ShapeNode::object().additional(value).build())
            }
            "Pick" | "Omit" => {
                expect_arity(name, args, 2, position)?;
                let base = self.inline(&args[0], mode)?;
                let mut keys = Vec::new();
                self.collect_keys(name, &args[1], position, &mut keys)?;
                if name == "Pick" {
                    pick(base, &keys, position)
                } else {
                    omit(base, &keys, position)
                }
            }
            _ => Err(TypeError::Unresolved {
                name: name.to_string(),
                position,
            }),
        }
    }

    fn lower_declared(
        &mut self,
        declaration: &'e TypeDeclaration,
        mode: Mode,
    ) -> Result<ShapeNode, TypeError> {
        // Aliases of other named types are transparent.
        if matches!(declaration.ty, TypeExpr::Named { .. }) {
            if self.aliasing.contains(&declaration.name) {
                return Err(TypeError::CircularAlias {
                    name: declaration.name.clone(),
                });
            }
            self.aliasing.push(declaration.name.clone());
            let result = self.lower(&declaration.ty, mode);
            self.aliasing.pop();
            return result;
        }

        let key = mode.definition_name(&declaration.name);
        if !self.definitions.contains_key(&key) {
            self.definitions.insert(key.clone(), ShapeNode::Any);
            self.pending.insert(key.clone());
            let aliasing = std::mem::take(&mut self.aliasing);
            let lowered = self.lower(&declaration.ty, mode);
            self.aliasing = aliasing;
            self.pending.remove(&key);
            self.definitions.insert(key.clone(), lowered?);
        }
        Ok(ShapeNode::reference(key))
    }

    fn lower_object(&mut self, members: &[ObjectMember], mode: Mode) -> Result<ShapeNode, TypeError> {
        let mut object = ShapeNode::object();
        let mut seen = HashSet::new();
        let mut has_index = false;

        for member in members {
            match member {
                ObjectMember::Property {
                    name,
                    optional,
                    ty,
                    position,
                } => {
                    if !seen.insert(name.as_str()) {
                        return Err(TypeError::DuplicateProperty {
                            property: name.clone(),
                            position: *position,
                        });
                    }
                    let shape = self.lower(ty, mode)?;
                    object = if *optional || mode == Mode::Partial {
                        object.optional(name.clone(), shape)
                    } else {
                        object.property(name.clone(), shape)
                    };
                }
                ObjectMember::Index { value, position } => {
                    if has_index {
                        return Err(TypeError::DuplicateProperty {
                            property: "[key: string]".to_string(),
                            position: *position,
                        });
                    }
                    has_index = true;
                    object = object.additional(self.lower(value, mode)?);
                }
            }
        }

        Ok(object.build())
    }

    fn lower_union(&mut self, variants: &[TypeExpr], mode: Mode) -> Result<ShapeNode, TypeError> {
        let mut flat: Vec<ShapeNode> = Vec::with_capacity(variants.len());
        for variant in variants {
            match self.lower(variant, mode)? {
                ShapeNode::Union { variants } => {
                    for inner in variants {
                        push_unique(&mut flat, inner);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        Ok(collapse_literals(flat))
    }

    fn lower_intersection(
        &mut self,
        parts: &[TypeExpr],
        mode: Mode,
    ) -> Result<ShapeNode, TypeError> {
        let mut product: Option<Vec<ShapeNode>> = None;

        for part in parts {
            let Some(alternatives) = self.object_alternatives(part, mode)? else {
                continue;
            };
            product = Some(match product {
                None => alternatives,
                Some(accumulated) => {
                    if accumulated.len().saturating_mul(alternatives.len())
                        > MAX_INTERSECTION_VARIANTS
                    {
                        return Err(TypeError::IntersectionTooLarge {
                            limit: MAX_INTERSECTION_VARIANTS,
                        });
                    }
                    let mut merged = Vec::new();
                    for left in &accumulated {
                        for right in &alternatives {
                            push_unique(&mut merged, merge_objects(left, right)?);
                        }
                    }
                    merged
                }
            });
        }

        Ok(match product {
            None => ShapeNode::Any,
            Some(mut variants) if variants.len() == 1 => variants.remove(0),
            Some(variants) => ShapeNode::union(variants),
        })
    }

    /// Returns the object shapes one intersection member stands for, or
    /// `None` when it accepts anything.
    fn object_alternatives(
        &mut self,
        part: &TypeExpr,
        mode: Mode,
    ) -> Result<Option<Vec<ShapeNode>>, TypeError> {
        let shape = self.inline(part, mode).map_err(recursive_intersection)?;
        if shape == ShapeNode::Any {
            return Ok(None);
        }

        let mut queue = vec![shape];
        let mut objects = Vec::new();
        while let Some(shape) = queue.pop() {
            match self.resolve(shape).map_err(recursive_intersection)? {
                object @ ShapeNode::Object { .. } => objects.push(object),
                ShapeNode::Union { variants } => queue.extend(variants.into_iter().rev()),
                other => {
                    return Err(TypeError::UnsupportedIntersection {
                        found: other.kind_name(),
                    })
                }
            }
        }
        Ok(Some(objects))
    }

    fn collect_keys(
        &self,
        generic: &str,
        expr: &TypeExpr,
        position: Position,
        keys: &mut Vec<String>,
    ) -> Result<(), TypeError> {
        let mut stack = vec![expr];
        let mut followed = 0;
        while let Some(expr) = stack.pop() {
            match expr {
                TypeExpr::Literal(LiteralValue::String(key)) => keys.push(key.clone()),
                TypeExpr::Union(variants) => stack.extend(variants.iter().rev()),
                TypeExpr::Named { name, args, .. } if args.is_empty() => {
                    let declaration = self.lookup(name).ok_or_else(|| TypeError::Unresolved {
                        name: name.clone(),
                        position,
                    })?;
                    followed += 1;
                    if followed > self.local.len() + self.shared.len() {
                        return Err(TypeError::CircularAlias { name: name.clone() });
                    }
                    stack.push(&declaration.ty);
                }
                _ => {
                    return Err(TypeError::InvalidGenericArgument {
                        name: generic.to_string(),
                        reason: "keys must be string literals".to_string(),
                        position,
                    })
                }
            }
        }
        Ok(())
    }
}

fn keyword_shape(keyword: KeywordType) -> ShapeNode {
    match keyword {
        KeywordType::String => ShapeNode::string(),
        KeywordType::Number => ShapeNode::number(),
        KeywordType::Integer => ShapeNode::integer(),
        KeywordType::Boolean => ShapeNode::boolean(),
        KeywordType::Null => ShapeNode::null(),
        KeywordType::Unknown => ShapeNode::Any,
    }
}

fn expect_arity(
    name: &str,
    args: &[TypeExpr],
    expected: usize,
    position: Position,
) -> Result<(), TypeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TypeError::WrongArity {
            name: name.to_string(),
            expected,
            found: args.len(),
            position,
        })
    }
}

fn recursive_intersection(err: TypeError) -> TypeError {
    match err {
        TypeError::CircularAlias { name } => TypeError::RecursiveIntersection { name },
        other => other,
    }
}

fn push_unique(shapes: &mut Vec<ShapeNode>, shape: ShapeNode) {
    if !shapes.contains(&shape) {
        shapes.push(shape);
    }
}

/// Folds a union of same-kind literals into one enumerated primitive.
fn collapse_literals(mut variants: Vec<ShapeNode>) -> ShapeNode {
    if variants.len() == 1 {
        return variants.remove(0);
    }
    match enumerated_literals(&variants) {
        Some((kind, values)) => ShapeNode::Primitive {
            kind,
            constraints: Constraints {
                enum_values: Some(values),
                ..Constraints::default()
            },
        },
        None => ShapeNode::union(variants),
    }
}

fn enumerated_literals(variants: &[ShapeNode]) -> Option<(PrimitiveKind, Vec<Value>)> {
    let mut kind = None;
    let mut values = Vec::new();
    for variant in variants {
        let ShapeNode::Primitive {
            kind: variant_kind,
            constraints,
        } = variant
        else {
            return None;
        };
        let enumerated = constraints.enum_values.as_ref()?;
        let only_enum = Constraints {
            enum_values: None,
            ..constraints.clone()
        }
        .is_empty();
        if !only_enum || kind.is_some_and(|k| k != *variant_kind) {
            return None;
        }
        kind = Some(*variant_kind);
        values.extend(enumerated.iter().cloned());
    }
    kind.map(|kind| (kind, values))
}

fn merge_objects(left: &ShapeNode, right: &ShapeNode) -> Result<ShapeNode, TypeError> {
    let (
        ShapeNode::Object {
            properties: left_properties,
            required: left_required,
            additional_allowed: left_open,
            additional: left_additional,
        },
        ShapeNode::Object {
            properties: right_properties,
            required: right_required,
            additional_allowed: right_open,
            additional: right_additional,
        },
    ) = (left, right)
    else {
        return Err(TypeError::UnsupportedIntersection {
            found: if matches!(left, ShapeNode::Object { .. }) {
                right.kind_name()
            } else {
                left.kind_name()
            },
        });
    };

    let mut properties = left_properties.clone();
    for (name, shape) in right_properties {
        match properties.get(name) {
            Some(existing) if existing != shape => {
                return Err(TypeError::ConflictingProperty {
                    property: name.clone(),
                })
            }
            Some(_) => {}
            None => {
                properties.insert(name.clone(), shape.clone());
            }
        }
    }

    let required: IndexSet<String> = properties
        .keys()
        .filter(|name| left_required.contains(*name) || right_required.contains(*name))
        .cloned()
        .collect();

    let additional_allowed = *left_open && *right_open;
    let additional = if additional_allowed {
        match (left_additional, right_additional) {
            (Some(l), Some(r)) if l != r => {
                return Err(TypeError::ConflictingProperty {
                    property: "[key: string]".to_string(),
                })
            }
            (l, r) => l.clone().or_else(|| r.clone()),
        }
    } else {
        None
    };

    Ok(ShapeNode::Object {
        properties,
        required,
        additional_allowed,
        additional,
    })
}

fn pick(base: ShapeNode, keys: &[String], position: Position) -> Result<ShapeNode, TypeError> {
    let (properties, required) = match base {
        ShapeNode::Object {
            properties,
            required,
            ..
        } => (properties, required),
        other => return Err(not_an_object("Pick", &other, position)),
    };

    if let Some(missing) = keys.iter().find(|key| !properties.contains_key(*key)) {
        return Err(TypeError::UnknownKey {
            key: missing.clone(),
            position,
        });
    }

    let properties: IndexMap<String, ShapeNode> = properties
        .into_iter()
        .filter(|(name, _)| keys.contains(name))
        .collect();
    let required = required
        .into_iter()
        .filter(|name| keys.contains(name))
        .collect();

    Ok(ShapeNode::Object {
        properties,
        required,
        additional_allowed: false,
        additional: None,
    })
}

fn omit(base: ShapeNode, keys: &[String], position: Position) -> Result<ShapeNode, TypeError> {
    match base {
        ShapeNode::Object {
            mut properties,
            mut required,
            additional_allowed,
            additional,
        } => {
            for key in keys {
                properties.shift_remove(key);
                required.shift_remove(key);
            }
            Ok(ShapeNode::Object {
                properties,
                required,
                additional_allowed,
                additional,
            })
        }
        other => Err(not_an_object("Omit", &other, position)),
    }
}

fn not_an_object(generic: &str, shape: &ShapeNode, position: Position) -> TypeError {
    TypeError::InvalidGenericArgument {
        name: generic.to_string(),
        reason: format!("expected an object type, found {}", shape.kind_name()),
        position,
    }
}

fn apply_annotation(
    mut shape: ShapeNode,
    spanned: &SpannedAnnotation,
) -> Result<ShapeNode, TypeError> {
    let applied = match (&spanned.annotation, &mut shape) {
        (
            Annotation::MinLength(_) | Annotation::MaxLength(_) | Annotation::Pattern(_),
            ShapeNode::Primitive {
                kind: PrimitiveKind::String,
                constraints,
            },
        ) => {
            match &spanned.annotation {
                Annotation::MinLength(n) => constraints.min_length = Some(*n),
                Annotation::MaxLength(n) => constraints.max_length = Some(*n),
                Annotation::Pattern(p) => constraints.pattern = Some(p.clone()),
                _ => {}
            }
            true
        }
        (
            Annotation::Minimum(_) | Annotation::Maximum(_) | Annotation::Integer,
            ShapeNode::Primitive {
                kind: kind @ (PrimitiveKind::Number | PrimitiveKind::Integer),
                constraints,
            },
        ) => {
            match &spanned.annotation {
                Annotation::Minimum(n) => constraints.minimum = Some(*n),
                Annotation::Maximum(n) => constraints.maximum = Some(*n),
                _ => *kind = PrimitiveKind::Integer,
            }
            true
        }
        (Annotation::Description(text), ShapeNode::Primitive { constraints, .. }) => {
            constraints.description = Some(text.clone());
            true
        }
        (
            Annotation::UniqueItems | Annotation::MinItems(_) | Annotation::MaxItems(_),
            ShapeNode::Array {
                unique_items,
                min_items,
                max_items,
                ..
            },
        ) => {
            match &spanned.annotation {
                Annotation::UniqueItems => *unique_items = true,
                Annotation::MinItems(n) => *min_items = Some(*n),
                Annotation::MaxItems(n) => *max_items = Some(*n),
                _ => {}
            }
            true
        }
        _ => false,
    };

    if applied {
        Ok(shape)
    } else {
        Err(TypeError::MisplacedAnnotation {
            annotation: spanned.annotation.name(),
            target: shape.kind_name(),
            position: spanned.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use serde_json::json;

    /// Lowers the default export of `source` and returns it with the
    /// definitions table.
    fn lower_default(source: &str) -> Result<(ShapeNode, IndexMap<String, ShapeNode>), TypeError> {
        let file = parse_source(source).unwrap();
        let local = TypeEnv::from_declarations(file.declarations)?;
        let shared = TypeEnv::new();
        let mut lowerer = Lowerer::new(&shared, &local)?;
        let shape = lowerer.lower(&file.default.unwrap().ty, Mode::Exact)?;
        Ok((shape, lowerer.into_definitions()))
    }

    fn required_of(shape: &ShapeNode) -> Vec<&str> {
        match shape {
            ShapeNode::Object { required, .. } => required.iter().map(String::as_str).collect(),
            other => panic!("expected object, got {other:?}"),
        }
    }

    // ==================== Basic Lowering Tests ====================

    #[test]
    fn test_named_types_become_references() {
        let (shape, definitions) =
            lower_default("type Id = string @minLength(1);\nexport default { id: Id };").unwrap();
        assert_eq!(
            shape,
            ShapeNode::object()
                .property("id", ShapeNode::reference("Id"))
                .build()
        );
        assert_eq!(definitions["Id"], ShapeNode::string().min_length(1));
    }

    #[test]
    fn test_literal_union_collapses_to_enum() {
        let (shape, _) = lower_default(r#"export default "GET" | "HEAD" | "GET";"#).unwrap();
        assert_eq!(shape, ShapeNode::string_enum(["GET", "HEAD"]));
    }

    #[test]
    fn test_mixed_union_stays_union() {
        let (shape, _) = lower_default(r#"export default "a" | null;"#).unwrap();
        assert_eq!(
            shape,
            ShapeNode::union(vec![ShapeNode::literal("a"), ShapeNode::null()])
        );
    }

    #[test]
    fn test_unknown_is_any() {
        let (shape, _) = lower_default("export default { data?: unknown };").unwrap();
        assert_eq!(shape, ShapeNode::object().optional("data", ShapeNode::Any).build());
    }

    #[test]
    fn test_unresolved_name() {
        let err = lower_default("export default Missing;").unwrap_err();
        assert!(matches!(err, TypeError::Unresolved { ref name, .. } if name == "Missing"));
    }

    #[test]
    fn test_duplicate_property() {
        let err = lower_default("export default { a: string, a: number };").unwrap_err();
        assert!(matches!(err, TypeError::DuplicateProperty { .. }));
    }

    // ==================== Recursion Tests ====================

    #[test]
    fn test_recursive_type_terminates() {
        let (shape, definitions) = lower_default(
            "type Node = { value: string, children: Node[] };\nexport default Node;",
        )
        .unwrap();
        assert_eq!(shape, ShapeNode::reference("Node"));
        assert_eq!(
            definitions["Node"],
            ShapeNode::object()
                .property("value", ShapeNode::string())
                .property("children", ShapeNode::array(ShapeNode::reference("Node")))
                .build()
        );
    }

    #[test]
    fn test_alias_of_alias_is_transparent() {
        let (shape, definitions) =
            lower_default("type A = B;\ntype B = { x: A };\nexport default A;").unwrap();
        assert_eq!(shape, ShapeNode::reference("B"));
        assert_eq!(definitions.keys().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn test_circular_alias() {
        let err = lower_default("type A = B;\ntype B = A;\nexport default A;").unwrap_err();
        assert!(matches!(err, TypeError::CircularAlias { .. }));
    }

    // ==================== Partial Tests ====================

    #[test]
    fn test_partial_is_deep_and_memoised() {
        let (shape, definitions) = lower_default(
            "type Node = { value: string, child: Node, tags: string[] };\n\
             export default Partial<Node>;",
        )
        .unwrap();
        assert_eq!(shape, ShapeNode::reference("Partial<Node>"));
        let partial = &definitions["Partial<Node>"];
        assert!(required_of(partial).is_empty());
        assert_eq!(
            partial,
            &ShapeNode::object()
                .optional("value", ShapeNode::string())
                .optional("child", ShapeNode::reference("Partial<Node>"))
                .optional("tags", ShapeNode::array(ShapeNode::string()))
                .build()
        );
        assert!(!definitions.contains_key("Node"));
    }

    #[test]
    fn test_partial_of_object_literal() {
        let (shape, _) =
            lower_default("export default Partial<{ a: string, b: { c: number } }>;").unwrap();
        assert_eq!(
            shape,
            ShapeNode::object()
                .optional("a", ShapeNode::string())
                .optional(
                    "b",
                    ShapeNode::object().optional("c", ShapeNode::number()).build()
                )
                .build()
        );
    }

    // ==================== Generic Tests ====================

    #[test]
    fn test_pick_and_omit() {
        let source = "type User = { id: string, name: string, age?: number };\n";
        let (picked, _) =
            lower_default(&format!("{source}export default Pick<User, \"age\" | \"id\">;"))
                .unwrap();
        assert_eq!(
            picked,
            ShapeNode::object()
                .property("id", ShapeNode::string())
                .optional("age", ShapeNode::number())
                .build()
        );

        let (omitted, _) =
            lower_default(&format!("{source}export default Omit<User, \"id\">;")).unwrap();
        assert_eq!(required_of(&omitted), vec!["name"]);
    }

    #[test]
    fn test_pick_unknown_key() {
        let err = lower_default("type U = { id: string };\nexport default Pick<U, \"nope\">;")
            .unwrap_err();
        assert!(matches!(err, TypeError::UnknownKey { ref key, .. } if key == "nope"));
    }

    #[test]
    fn test_record_and_index_signature() {
        let (record, _) = lower_default("export default Record<string, number>;").unwrap();
        let (index, _) = lower_default("export default { [key: string]: number };").unwrap();
        assert_eq!(record, index);
        assert_eq!(record, ShapeNode::object().additional(ShapeNode::number()).build());
    }

    #[test]
    fn test_record_key_must_be_string() {
        let err = lower_default("export default Record<number, string>;").unwrap_err();
        assert!(matches!(err, TypeError::InvalidGenericArgument { .. }));
    }

    #[test]
    fn test_wrong_arity() {
        let err = lower_default("export default Partial<string, number>;").unwrap_err();
        assert!(matches!(
            err,
            TypeError::WrongArity {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    // ==================== Intersection Tests ====================

    #[test]
    fn test_intersection_merges_objects() {
        let (shape, _) = lower_default(
            "type Base = { id: string };\nexport default Base & { content?: string };",
        )
        .unwrap();
        assert_eq!(
            shape,
            ShapeNode::object()
                .property("id", ShapeNode::string())
                .optional("content", ShapeNode::string())
                .build()
        );
    }

    #[test]
    fn test_intersection_distributes_over_union() {
        let (shape, _) = lower_default(
            "export default { q: string } & ({ method: \"GET\" } | { method: \"POST\" });",
        )
        .unwrap();
        let ShapeNode::Union { variants } = shape else {
            panic!("expected union");
        };
        assert_eq!(variants.len(), 2);
        assert_eq!(required_of(&variants[0]), vec!["q", "method"]);
        assert_eq!(
            variants[1],
            ShapeNode::object()
                .property("q", ShapeNode::string())
                .property("method", ShapeNode::literal("POST"))
                .build()
        );
    }

    #[test]
    fn test_intersection_conflict() {
        let err = lower_default("export default { a: string } & { a: number };").unwrap_err();
        assert!(matches!(err, TypeError::ConflictingProperty { ref property } if property == "a"));
    }

    #[test]
    fn test_intersection_requires_objects() {
        let err = lower_default("export default string & { a: number };").unwrap_err();
        assert!(matches!(err, TypeError::UnsupportedIntersection { found: "string" }));
    }

    #[test]
    fn test_recursive_intersection() {
        let err = lower_default("type T = T & { a: string };\nexport default T;").unwrap_err();
        assert!(matches!(err, TypeError::RecursiveIntersection { .. }));
    }

    // ==================== Annotation Tests ====================

    #[test]
    fn test_annotations_on_named_type() {
        let (shape, _) = lower_default(
            "type Content = string @minLength(1);\nexport default Content @maxLength(5);",
        )
        .unwrap();
        assert_eq!(shape, ShapeNode::string().min_length(1).max_length(5));
    }

    #[test]
    fn test_integer_annotation() {
        let (shape, _) = lower_default("export default number @integer @minimum(0);").unwrap();
        assert_eq!(shape, ShapeNode::integer().minimum(0.0));
    }

    #[test]
    fn test_array_annotations() {
        let (shape, _) =
            lower_default("export default string[] @uniqueItems @maxItems(3);").unwrap();
        assert_eq!(shape, ShapeNode::array(ShapeNode::string()).unique_items().max_items(3));
    }

    #[test]
    fn test_misplaced_annotation() {
        let err = lower_default("export default { a: string } @minLength(1);").unwrap_err();
        assert!(matches!(
            err,
            TypeError::MisplacedAnnotation {
                annotation: "minLength",
                target: "object",
                ..
            }
        ));
    }

    #[test]
    fn test_literal_number_keeps_value() {
        let (shape, _) = lower_default("export default 3;").unwrap();
        assert_eq!(shape.literal_value(), Some(&json!(3)));
    }

    #[test]
    fn test_local_may_not_shadow_shared() {
        let shared = TypeEnv::from_declarations(
            parse_source("type Id = string;").unwrap().declarations,
        )
        .unwrap();
        let local = TypeEnv::from_declarations(
            parse_source("type Id = number;").unwrap().declarations,
        )
        .unwrap();
        assert!(matches!(
            Lowerer::new(&shared, &local),
            Err(TypeError::DuplicateType { .. })
        ));
    }
}
