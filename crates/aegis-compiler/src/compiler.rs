//! Descriptor to schema document compilation.
//!
//! The request schema is built by walking the descriptor's method contracts
//! in declaration order. Each named shape is copied into the output table the
//! first time it is reached, under a sanitized unique name. A name is
//! allocated before its shape is copied, so a recursive type that reaches
//! itself again finds the allocated name and emits a reference instead of
//! expanding forever.

use std::collections::HashMap;

use aegis_core::{ContractDescriptor, SchemaArtifact, SchemaDocument, SchemaKind, ShapeNode};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::artifact::render_artifact;
use crate::error::{CompilationError, CompilationResult};
use crate::naming::{NameTable, METHOD_ROOT, REQUEST_ROOT};

/// The two documents compiled for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledContract {
    /// Endpoint identity.
    pub endpoint: String,
    /// Allowed-method enumeration.
    pub method_schema: SchemaDocument,
    /// Request union.
    pub request_schema: SchemaDocument,
}

impl CompiledContract {
    /// Wraps both documents in artifact envelopes.
    pub fn artifacts(&self) -> [SchemaArtifact; 2] {
        [
            SchemaArtifact::new(&self.endpoint, SchemaKind::Method, self.method_schema.clone()),
            SchemaArtifact::new(
                &self.endpoint,
                SchemaKind::Request,
                self.request_schema.clone(),
            ),
        ]
    }

    /// Renders both artifacts to their on-disk text.
    ///
    /// # Errors
    ///
    /// Returns [`CompilationError::Render`] when serialization fails.
    pub fn render(&self) -> CompilationResult<RenderedContract> {
        let [method, request] = self.artifacts();
        let render = |artifact: &SchemaArtifact| {
            render_artifact(artifact).map_err(|source| CompilationError::Render {
                endpoint: self.endpoint.clone(),
                source,
            })
        };
        Ok(RenderedContract {
            method: render(&method)?,
            request: render(&request)?,
        })
    }
}

/// Rendered artifact text for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContract {
    /// Method schema artifact.
    pub method: String,
    /// Request schema artifact.
    pub request: String,
}

impl RenderedContract {
    /// Returns the text for one artifact kind.
    pub fn get(&self, kind: SchemaKind) -> &str {
        match kind {
            SchemaKind::Method => &self.method,
            SchemaKind::Request => &self.request,
        }
    }
}

/// Compiles contract descriptors into schema documents.
///
/// Compilation is a pure function of the descriptor: the same descriptor
/// always yields byte-identical rendered artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompiler;

impl SchemaCompiler {
    /// Creates a compiler.
    pub fn new() -> Self {
        Self
    }

    /// Compiles one descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilationError`] naming the endpoint when a reference
    /// does not resolve, a pattern does not compile, bounds are
    /// unsatisfiable, or the result contains a reference-only cycle.
    pub fn compile(&self, descriptor: &ContractDescriptor) -> CompilationResult<CompiledContract> {
        let endpoint = descriptor.endpoint();

        let method_schema = SchemaDocument::new(
            METHOD_ROOT,
            IndexMap::from([(
                METHOD_ROOT.to_string(),
                ShapeNode::string_enum(descriptor.method_names()),
            )]),
        );

        let mut flattener = Flattener::new(endpoint, descriptor.definitions());
        flattener.output.insert(REQUEST_ROOT.to_string(), ShapeNode::Any);

        let mut branches = Vec::new();
        for (method, contract) in descriptor.contracts() {
            let query = flattener.rewrite(&contract.query)?;
            let body = flattener.rewrite(&contract.body)?;

            let mut branch =
                ShapeNode::object().property("method", ShapeNode::literal(method.as_str()));
            branch = if contract.query_required {
                branch.property("query", query)
            } else {
                branch.optional("query", query)
            };
            branch = if contract.body_required {
                branch.property("body", body)
            } else {
                branch.optional("body", body)
            };
            branches.push(branch.build());
        }
        flattener
            .output
            .insert(REQUEST_ROOT.to_string(), ShapeNode::union(branches));

        let request_schema = SchemaDocument::new(REQUEST_ROOT, flattener.output);

        for document in [&method_schema, &request_schema] {
            document
                .check_integrity()
                .map_err(|source| CompilationError::Model {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            for (name, shape) in &document.definitions {
                check_constraints(endpoint, name, shape)?;
            }
        }

        debug!(
            endpoint,
            methods = descriptor.method_names().len(),
            definitions = request_schema.definitions.len(),
            "compiled contract"
        );

        Ok(CompiledContract {
            endpoint: endpoint.to_string(),
            method_schema,
            request_schema,
        })
    }
}

/// Copies reachable definitions into a fresh, uniquely named table.
struct Flattener<'d> {
    endpoint: &'d str,
    source: &'d IndexMap<String, ShapeNode>,
    names: NameTable,
    assigned: HashMap<String, String>,
    output: IndexMap<String, ShapeNode>,
}

impl<'d> Flattener<'d> {
    fn new(endpoint: &'d str, source: &'d IndexMap<String, ShapeNode>) -> Self {
        Self {
            endpoint,
            source,
            names: NameTable::new(),
            assigned: HashMap::new(),
            output: IndexMap::new(),
        }
    }

    fn rewrite(&mut self, shape: &ShapeNode) -> CompilationResult<ShapeNode> {
        Ok(match shape {
            ShapeNode::Reference { name } => ShapeNode::reference(self.definition(name)?),
            ShapeNode::Object {
                properties,
                required,
                additional_allowed,
                additional,
            } => {
                let mut rewritten = IndexMap::with_capacity(properties.len());
                for (key, value) in properties {
                    rewritten.insert(key.clone(), self.rewrite(value)?);
                }
                let additional = match additional {
                    Some(shape) => Some(Box::new(self.rewrite(shape)?)),
                    None => None,
                };
                ShapeNode::Object {
                    properties: rewritten,
                    required: required.clone(),
                    additional_allowed: *additional_allowed,
                    additional,
                }
            }
            ShapeNode::Array {
                element,
                unique_items,
                min_items,
                max_items,
            } => ShapeNode::Array {
                element: Box::new(self.rewrite(element)?),
                unique_items: *unique_items,
                min_items: *min_items,
                max_items: *max_items,
            },
            ShapeNode::Union { variants } => ShapeNode::Union {
                variants: variants
                    .iter()
                    .map(|variant| self.rewrite(variant))
                    .collect::<CompilationResult<_>>()?,
            },
            ShapeNode::Primitive { .. } | ShapeNode::Any => shape.clone(),
        })
    }

    /// Returns the output name for a source definition, copying it on first
    /// use.
    fn definition(&mut self, source_name: &str) -> CompilationResult<String> {
        if let Some(name) = self.assigned.get(source_name) {
            return Ok(name.clone());
        }

        let shape = self
            .source
            .get(source_name)
            .ok_or_else(|| CompilationError::UnresolvedReference {
                endpoint: self.endpoint.to_string(),
                name: source_name.to_string(),
            })?;

        let name = self.names.allocate(source_name);
        // Registered before the copy so re-entry yields a reference.
        self.assigned.insert(source_name.to_string(), name.clone());
        self.output.insert(name.clone(), ShapeNode::Any);

        let rewritten = self.rewrite(shape)?;
        self.output.insert(name.clone(), rewritten);
        Ok(name)
    }
}

/// Rejects constraints no value can satisfy and patterns that do not compile.
fn check_constraints(endpoint: &str, definition: &str, shape: &ShapeNode) -> CompilationResult<()> {
    let bounds = |reason: String| CompilationError::InvalidBounds {
        endpoint: endpoint.to_string(),
        definition: definition.to_string(),
        reason,
    };

    match shape {
        ShapeNode::Primitive { constraints, .. } => {
            if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length) {
                if min > max {
                    return Err(bounds(format!("min_length {min} > max_length {max}")));
                }
            }
            if let (Some(min), Some(max)) = (constraints.minimum, constraints.maximum) {
                if min > max {
                    return Err(bounds(format!("minimum {min} > maximum {max}")));
                }
            }
            if let Some(pattern) = &constraints.pattern {
                Regex::new(pattern).map_err(|e| CompilationError::InvalidPattern {
                    endpoint: endpoint.to_string(),
                    definition: definition.to_string(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            }
            Ok(())
        }
        ShapeNode::Object {
            properties,
            additional,
            ..
        } => {
            for value in properties.values() {
                check_constraints(endpoint, definition, value)?;
            }
            match additional {
                Some(shape) => check_constraints(endpoint, definition, shape),
                None => Ok(()),
            }
        }
        ShapeNode::Array {
            element,
            min_items,
            max_items,
            ..
        } => {
            if let (Some(min), Some(max)) = (min_items, max_items) {
                if min > max {
                    return Err(bounds(format!("min_items {min} > max_items {max}")));
                }
            }
            check_constraints(endpoint, definition, element)
        }
        ShapeNode::Union { variants } => variants
            .iter()
            .try_for_each(|variant| check_constraints(endpoint, definition, variant)),
        ShapeNode::Reference { .. } | ShapeNode::Any => Ok(()),
    }
}
