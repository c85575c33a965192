//! Schema documents and their on-disk envelope.
//!
//! A [`SchemaDocument`] is a flat definitions table plus the name of its root
//! definition. Two documents exist per endpoint: the method schema (root
//! resolves to a string enumeration of allowed methods) and the request
//! schema (root resolves to a union with one object branch per method).

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::shape::ShapeNode;

/// Format tag written into every artifact.
pub const ARTIFACT_FORMAT: &str = "aegis.schema/v1";

/// Banner written into every artifact.
pub const GENERATED_BY: &str = "aegis generate; regenerate instead of editing by hand";

/// File suffix of a method schema artifact.
pub const METHOD_SCHEMA_SUFFIX: &str = ".method.schema.json";

/// File suffix of a request schema artifact.
pub const REQUEST_SCHEMA_SUFFIX: &str = ".request.schema.json";

/// A compiled, self-contained schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Name of the root definition.
    pub root: String,
    /// Definitions table.
    pub definitions: IndexMap<String, ShapeNode>,
}

impl SchemaDocument {
    /// Creates a document.
    pub fn new(root: impl Into<String>, definitions: IndexMap<String, ShapeNode>) -> Self {
        Self {
            root: root.into(),
            definitions,
        }
    }

    /// Returns the root definition, if present.
    pub fn root_shape(&self) -> Option<&ShapeNode> {
        self.definitions.get(&self.root)
    }

    /// Follows a chain of references to the first non-reference node.
    ///
    /// A dangling reference, or a chain longer than the table, is returned
    /// unchanged.
    pub fn resolve<'a>(&'a self, shape: &'a ShapeNode) -> &'a ShapeNode {
        let mut current = shape;
        for _ in 0..=self.definitions.len() {
            match current {
                ShapeNode::Reference { name } => match self.definitions.get(name) {
                    Some(target) => current = target,
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Checks that the document can be validated against safely.
    ///
    /// The root must exist, every reference must resolve, and no definition
    /// may reach itself through references and union variants alone. A cycle
    /// that passes through an object property or array element is a
    /// legitimate recursive type and is accepted.
    pub fn check_integrity(&self) -> ModelResult<()> {
        if !self.definitions.contains_key(&self.root) {
            return Err(ModelError::MissingRoot {
                name: self.root.clone(),
            });
        }

        for (name, shape) in &self.definitions {
            for reference in shape.references() {
                if !self.definitions.contains_key(&reference) {
                    return Err(ModelError::DanglingReference {
                        name: reference,
                        from: name.clone(),
                    });
                }
            }
        }

        self.check_unguarded_cycles()
    }

    fn check_unguarded_cycles(&self) -> ModelResult<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            name: &'a str,
            edges: &HashMap<&'a str, Vec<&'a str>>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> ModelResult<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(ModelError::UnguardedCycle {
                        name: name.to_string(),
                    })
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(targets) = edges.get(name) {
                for target in targets {
                    visit(*target, edges, marks)?;
                }
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let edges: HashMap<&str, Vec<&str>> = self
            .definitions
            .iter()
            .map(|(name, shape)| {
                let mut targets = Vec::new();
                collect_unguarded(shape, &mut targets);
                (name.as_str(), targets)
            })
            .collect();

        let mut marks = HashMap::new();
        for name in self.definitions.keys() {
            visit(name, &edges, &mut marks)?;
        }
        Ok(())
    }
}

/// Collects references reachable without descending into an object or array.
fn collect_unguarded<'a>(shape: &'a ShapeNode, out: &mut Vec<&'a str>) {
    match shape {
        ShapeNode::Reference { name } => out.push(name),
        ShapeNode::Union { variants } => {
            for variant in variants {
                collect_unguarded(variant, out);
            }
        }
        _ => {}
    }
}

/// Which validation target a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Allowed-method enumeration.
    Method,
    /// Full `{method, query, body}` request union.
    Request,
}

impl SchemaKind {
    /// Returns the artifact file suffix for this kind.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Method => METHOD_SCHEMA_SUFFIX,
            Self::Request => REQUEST_SCHEMA_SUFFIX,
        }
    }
}

/// On-disk envelope around a schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaArtifact {
    /// Format tag, always [`ARTIFACT_FORMAT`] when written by this build.
    pub format: String,
    /// Provenance banner.
    pub generated_by: String,
    /// Endpoint identity.
    pub endpoint: String,
    /// Which document this is.
    pub kind: SchemaKind,
    /// The document itself.
    pub document: SchemaDocument,
}

impl SchemaArtifact {
    /// Wraps a document in an envelope stamped with the current format.
    pub fn new(endpoint: impl Into<String>, kind: SchemaKind, document: SchemaDocument) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            generated_by: GENERATED_BY.to_string(),
            endpoint: endpoint.into(),
            kind,
            document,
        }
    }

    /// Checks the format tag.
    pub fn check_format(&self) -> ModelResult<()> {
        if self.format == ARTIFACT_FORMAT {
            Ok(())
        } else {
            Err(ModelError::UnsupportedFormat {
                found: self.format.clone(),
                expected: ARTIFACT_FORMAT,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(definitions: Vec<(&str, ShapeNode)>) -> SchemaDocument {
        SchemaDocument::new(
            "Root",
            definitions
                .into_iter()
                .map(|(name, shape)| (name.to_string(), shape))
                .collect(),
        )
    }

    #[test]
    fn test_integrity_accepts_recursive_object() {
        let doc = document(vec![(
            "Root",
            ShapeNode::object()
                .optional("child", ShapeNode::reference("Root"))
                .build(),
        )]);
        assert!(doc.check_integrity().is_ok());
    }

    #[test]
    fn test_integrity_accepts_recursion_through_array() {
        let doc = document(vec![
            ("Root", ShapeNode::reference("Tree")),
            (
                "Tree",
                ShapeNode::union(vec![
                    ShapeNode::string(),
                    ShapeNode::array(ShapeNode::reference("Tree")),
                ]),
            ),
        ]);
        assert!(doc.check_integrity().is_ok());
    }

    #[test]
    fn test_integrity_rejects_missing_root() {
        let doc = document(vec![("Other", ShapeNode::string())]);
        assert!(matches!(
            doc.check_integrity(),
            Err(ModelError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_integrity_rejects_dangling_reference() {
        let doc = document(vec![(
            "Root",
            ShapeNode::object()
                .property("a", ShapeNode::reference("Nowhere"))
                .build(),
        )]);
        assert_eq!(
            doc.check_integrity(),
            Err(ModelError::DanglingReference {
                name: "Nowhere".to_string(),
                from: "Root".to_string(),
            })
        );
    }

    #[test]
    fn test_integrity_rejects_alias_cycle() {
        let doc = document(vec![
            ("Root", ShapeNode::reference("A")),
            ("A", ShapeNode::union(vec![ShapeNode::null(), ShapeNode::reference("B")])),
            ("B", ShapeNode::reference("A")),
        ]);
        assert!(matches!(
            doc.check_integrity(),
            Err(ModelError::UnguardedCycle { .. })
        ));
    }

    #[test]
    fn test_resolve_follows_chain() {
        let doc = document(vec![
            ("Root", ShapeNode::reference("A")),
            ("A", ShapeNode::string()),
        ]);
        let root = ShapeNode::reference("Root");
        assert_eq!(doc.resolve(&root), &ShapeNode::string());
    }

    #[test]
    fn test_artifact_format_check() {
        let mut artifact = SchemaArtifact::new(
            "x",
            SchemaKind::Method,
            document(vec![("Root", ShapeNode::string_enum(["GET"]))]),
        );
        assert!(artifact.check_format().is_ok());

        artifact.format = "other/v9".to_string();
        assert!(matches!(
            artifact.check_format(),
            Err(ModelError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_kind_suffix() {
        assert_eq!(SchemaKind::Method.suffix(), ".method.schema.json");
        assert_eq!(SchemaKind::Request.suffix(), ".request.schema.json");
    }
}
