//! Contract extraction.
//!
//! The extractor turns one endpoint file into a [`ContractDescriptor`]. The
//! file's `export default` type must normalise to a union of objects, each
//! carrying a `method` literal and optional `query` and `body` members.

use std::collections::HashSet;
use std::path::Path;

use aegis_core::{ContractDescriptor, MethodContract, ShapeNode};
use http::Method;
use indexmap::IndexMap;
use tracing::debug;

use crate::discovery::EndpointSource;
use crate::env::TypeEnv;
use crate::error::{ExtractionError, ExtractionResult};
use crate::lower::{Lowerer, Mode};
use crate::parser::parse_source;

const METHOD_KEY: &str = "method";
const QUERY_KEY: &str = "query";
const BODY_KEY: &str = "body";

/// Named types shared by every endpoint.
#[derive(Debug, Clone, Default)]
pub struct SharedTypes {
    env: TypeEnv,
}

impl SharedTypes {
    /// Creates an empty set of shared types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a shared declaration file and adds its types.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::SharedTypes`] when the file does not parse,
    /// exports a default type, or redeclares a name.
    pub fn add_source(&mut self, origin: impl AsRef<Path>, source: &str) -> ExtractionResult<()> {
        let origin = origin.as_ref();
        let shared_error = |message: String| ExtractionError::SharedTypes {
            path: origin.to_path_buf(),
            message,
        };

        let file = parse_source(source).map_err(|e| shared_error(e.to_string()))?;
        if file.default.is_some() {
            return Err(shared_error(
                "shared type files cannot declare `export default`".to_string(),
            ));
        }
        self.env
            .extend(file.declarations)
            .map_err(|e| shared_error(e.to_string()))
    }

    /// Returns the shared environment.
    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    /// Returns the number of shared types.
    pub fn len(&self) -> usize {
        self.env.len()
    }

    /// Returns true when no type is shared.
    pub fn is_empty(&self) -> bool {
        self.env.is_empty()
    }
}

/// Extracts contract descriptors from endpoint declaration files.
#[derive(Debug, Clone, Default)]
pub struct ContractExtractor {
    shared: SharedTypes,
}

impl ContractExtractor {
    /// Creates an extractor over the given shared types.
    pub fn new(shared: SharedTypes) -> Self {
        Self { shared }
    }

    /// Returns the shared types.
    pub fn shared(&self) -> &SharedTypes {
        &self.shared
    }

    /// Reads and extracts one discovered endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Io`] when the file cannot be read, or any
    /// error from [`ContractExtractor::extract`].
    pub fn extract_file(&self, source: &EndpointSource) -> ExtractionResult<ContractDescriptor> {
        let text = std::fs::read_to_string(&source.path)
            .map_err(|e| ExtractionError::io(&source.path, e))?;
        self.extract(&source.endpoint, &text)
    }

    /// Extracts the contract declared by `source` for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] naming the endpoint when the file does
    /// not parse, a type does not resolve, or the default type is not a union
    /// discriminated on `method`.
    pub fn extract(&self, endpoint: &str, source: &str) -> ExtractionResult<ContractDescriptor> {
        let type_error = |source| ExtractionError::Type {
            endpoint: endpoint.to_string(),
            source,
        };

        let file = parse_source(source).map_err(|source| ExtractionError::Declaration {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let default = file
            .default
            .ok_or_else(|| ExtractionError::MissingDefault {
                endpoint: endpoint.to_string(),
            })?;

        let local = TypeEnv::from_declarations(file.declarations).map_err(type_error)?;
        let mut lowerer = Lowerer::new(self.shared.env(), &local).map_err(type_error)?;
        let request = lowerer.inline(&default.ty, Mode::Exact).map_err(type_error)?;

        let members = match request {
            ShapeNode::Union { variants } => variants,
            other => vec![other],
        };

        let mut builder = ContractDescriptor::builder(endpoint);
        let mut seen = HashSet::new();
        let mut expanded = HashSet::new();
        let mut roots = Vec::new();
        let mut pending: Vec<ShapeNode> = members.into_iter().rev().collect();
        let mut index = 0;
        while let Some(member) = pending.pop() {
            if let ShapeNode::Reference { name } = &member {
                if !expanded.insert(name.clone()) {
                    return Err(ExtractionError::NotDiscriminated {
                        endpoint: endpoint.to_string(),
                        reason: format!("`{name}` appears more than once among the request members"),
                    });
                }
            }
            let member = match lowerer.resolve(member).map_err(type_error)? {
                ShapeNode::Union { variants } => {
                    pending.extend(variants.into_iter().rev());
                    continue;
                }
                member => member,
            };
            let (methods, contract) = member_contract(&lowerer, endpoint, index, member)?;
            index += 1;
            roots.push(contract.query.clone());
            roots.push(contract.body.clone());
            for method in methods {
                if !seen.insert(method.clone()) {
                    return Err(ExtractionError::DuplicateMethod {
                        endpoint: endpoint.to_string(),
                        method: method.to_string(),
                    });
                }
                builder = builder.method(method, contract.clone());
            }
        }

        let definitions = reachable_definitions(&roots, lowerer.into_definitions());
        let descriptor = builder
            .definitions(definitions)
            .build()
            .map_err(|source| ExtractionError::Model {
                endpoint: endpoint.to_string(),
                source,
            })?;

        debug!(
            endpoint,
            methods = ?descriptor.method_names(),
            definitions = descriptor.definitions().len(),
            "extracted contract"
        );
        Ok(descriptor)
    }
}

/// Splits one request member into its methods and their shared contract.
fn member_contract(
    lowerer: &Lowerer<'_>,
    endpoint: &str,
    index: usize,
    member: ShapeNode,
) -> ExtractionResult<(Vec<Method>, MethodContract)> {
    let not_discriminated = |reason: String| ExtractionError::NotDiscriminated {
        endpoint: endpoint.to_string(),
        reason,
    };

    let (mut properties, required, additional_allowed) = match member {
        ShapeNode::Object {
            properties,
            required,
            additional_allowed,
            ..
        } => (properties, required, additional_allowed),
        other => {
            return Err(not_discriminated(format!(
                "member {} is {}, not an object",
                index + 1,
                other.kind_name()
            )))
        }
    };

    if additional_allowed {
        return Err(not_discriminated(format!(
            "member {} declares an index signature",
            index + 1
        )));
    }
    if let Some(field) = properties
        .keys()
        .find(|key| ![METHOD_KEY, QUERY_KEY, BODY_KEY].contains(&key.as_str()))
    {
        return Err(ExtractionError::UnexpectedRequestField {
            endpoint: endpoint.to_string(),
            field: field.clone(),
        });
    }

    let method_shape = properties
        .shift_remove(METHOD_KEY)
        .ok_or_else(|| not_discriminated(format!("member {} has no `method`", index + 1)))?;
    if !required.contains(METHOD_KEY) {
        return Err(not_discriminated(format!(
            "member {} declares `method` as optional",
            index + 1
        )));
    }
    let method_shape = lowerer
        .resolve(method_shape)
        .map_err(|source| ExtractionError::Type {
            endpoint: endpoint.to_string(),
            source,
        })?;
    let methods = method_literals(endpoint, index, &method_shape)?;

    let mut contract = MethodContract::new();
    if let Some(query) = properties.shift_remove(QUERY_KEY) {
        contract = if required.contains(QUERY_KEY) {
            contract.query(query)
        } else {
            contract.optional_query(query)
        };
    }
    if let Some(body) = properties.shift_remove(BODY_KEY) {
        contract = if required.contains(BODY_KEY) {
            contract.body(body)
        } else {
            contract.optional_body(body)
        };
    }

    Ok((methods, contract))
}

fn method_literals(endpoint: &str, index: usize, shape: &ShapeNode) -> ExtractionResult<Vec<Method>> {
    let literals = match shape {
        ShapeNode::Primitive { constraints, .. } => constraints
            .enum_values
            .as_deref()
            .filter(|values| values.iter().all(serde_json::Value::is_string)),
        _ => None,
    };
    let Some(literals) = literals else {
        return Err(ExtractionError::NotDiscriminated {
            endpoint: endpoint.to_string(),
            reason: format!(
                "`method` of member {} must be a string literal or a union of string literals",
                index + 1
            ),
        });
    };

    literals
        .iter()
        .filter_map(serde_json::Value::as_str)
        .map(|name| {
            parse_method(name).ok_or_else(|| ExtractionError::InvalidMethod {
                endpoint: endpoint.to_string(),
                method: name.to_string(),
            })
        })
        .collect()
}

/// Maps a method literal to a standard HTTP method.
fn parse_method(name: &str) -> Option<Method> {
    match name {
        "GET" => Some(Method::GET),
        "HEAD" => Some(Method::HEAD),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        "OPTIONS" => Some(Method::OPTIONS),
        "CONNECT" => Some(Method::CONNECT),
        "TRACE" => Some(Method::TRACE),
        _ => None,
    }
}

/// Keeps only the definitions reachable from `roots`, in their original order.
fn reachable_definitions(
    roots: &[ShapeNode],
    definitions: IndexMap<String, ShapeNode>,
) -> IndexMap<String, ShapeNode> {
    let mut reachable = HashSet::new();
    let mut queue: Vec<String> = roots.iter().flat_map(ShapeNode::references).collect();
    while let Some(name) = queue.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(shape) = definitions.get(&name) {
            queue.extend(shape.references());
        }
    }

    definitions
        .into_iter()
        .filter(|(name, _)| reachable.contains(name))
        .collect()
}
