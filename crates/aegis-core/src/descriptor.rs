//! Contract descriptors.
//!
//! A [`ContractDescriptor`] is the language-neutral record of what one
//! endpoint accepts: the allowed HTTP methods, in declaration order, and for
//! each of them the shape of `query` and `body`. Named shapes referenced by
//! those slots live in the descriptor's definitions table.
//!
//! # Example
//!
//! ```
//! use aegis_core::{ContractDescriptor, MethodContract, ShapeNode};
//! use http::Method;
//!
//! let query = ShapeNode::object().property("messageID", ShapeNode::string()).build();
//!
//! let descriptor = ContractDescriptor::builder("messages/[messageID]/index")
//!     .method(Method::DELETE, MethodContract::new().query(query.clone()))
//!     .method(
//!         Method::PATCH,
//!         MethodContract::new().query(query).body(
//!             ShapeNode::object()
//!                 .property("content", ShapeNode::string().min_length(1).max_length(20_000))
//!                 .build(),
//!         ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(descriptor.method_names(), vec!["DELETE", "PATCH"]);
//! ```

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::shape::ShapeNode;

/// Request shape accepted for one HTTP method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodContract {
    /// Shape of the query object.
    pub query: ShapeNode,
    /// Whether the request must carry a query.
    #[serde(default)]
    pub query_required: bool,
    /// Shape of the body.
    pub body: ShapeNode,
    /// Whether the request must carry a body.
    #[serde(default)]
    pub body_required: bool,
}

impl Default for MethodContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodContract {
    /// Creates a contract whose query and body are optional and unconstrained.
    #[must_use]
    pub fn new() -> Self {
        Self {
            query: ShapeNode::Any,
            query_required: false,
            body: ShapeNode::Any,
            body_required: false,
        }
    }

    /// Sets a required query shape.
    #[must_use]
    pub fn query(mut self, shape: ShapeNode) -> Self {
        self.query = shape;
        self.query_required = true;
        self
    }

    /// Sets an optional query shape.
    #[must_use]
    pub fn optional_query(mut self, shape: ShapeNode) -> Self {
        self.query = shape;
        self.query_required = false;
        self
    }

    /// Sets a required body shape.
    #[must_use]
    pub fn body(mut self, shape: ShapeNode) -> Self {
        self.body = shape;
        self.body_required = true;
        self
    }

    /// Sets an optional body shape.
    #[must_use]
    pub fn optional_body(mut self, shape: ShapeNode) -> Self {
        self.body = shape;
        self.body_required = false;
        self
    }
}

/// Per-endpoint record of allowed methods and their request shapes.
///
/// Every allowed method has exactly one [`MethodContract`]; the builder and
/// the deserializer both reject a repeated method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    endpoint: String,
    #[serde(with = "method_map_serde")]
    methods: IndexMap<Method, MethodContract>,
    #[serde(default)]
    definitions: IndexMap<String, ShapeNode>,
}

impl ContractDescriptor {
    /// Creates a new descriptor builder.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> ContractDescriptorBuilder {
        ContractDescriptorBuilder::new(endpoint)
    }

    /// Returns the endpoint identity.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the allowed methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.keys()
    }

    /// Returns the allowed method names in declaration order.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(Method::as_str).collect()
    }

    /// Returns `(method, contract)` pairs in declaration order.
    pub fn contracts(&self) -> impl Iterator<Item = (&Method, &MethodContract)> {
        self.methods.iter()
    }

    /// Returns the contract for one method.
    pub fn contract(&self, method: &Method) -> Option<&MethodContract> {
        self.methods.get(method)
    }

    /// Returns whether the method is allowed.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains_key(method)
    }

    /// Returns the named shapes referenced by the contracts.
    pub fn definitions(&self) -> &IndexMap<String, ShapeNode> {
        &self.definitions
    }

    /// Returns one named shape.
    pub fn definition(&self, name: &str) -> Option<&ShapeNode> {
        self.definitions.get(name)
    }
}

/// Builder for [`ContractDescriptor`].
#[derive(Debug, Clone)]
pub struct ContractDescriptorBuilder {
    endpoint: String,
    methods: Vec<(Method, MethodContract)>,
    definitions: IndexMap<String, ShapeNode>,
}

impl ContractDescriptorBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            methods: Vec::new(),
            definitions: IndexMap::new(),
        }
    }

    /// Adds an allowed method.
    #[must_use]
    pub fn method(mut self, method: Method, contract: MethodContract) -> Self {
        self.methods.push((method, contract));
        self
    }

    /// Adds a named shape.
    #[must_use]
    pub fn definition(mut self, name: impl Into<String>, shape: ShapeNode) -> Self {
        self.definitions.insert(name.into(), shape);
        self
    }

    /// Adds several named shapes, keeping their order.
    #[must_use]
    pub fn definitions(mut self, definitions: impl IntoIterator<Item = (String, ShapeNode)>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyContract`] when no method was added and
    /// [`ModelError::DuplicateMethod`] when a method was added twice.
    pub fn build(self) -> ModelResult<ContractDescriptor> {
        if self.methods.is_empty() {
            return Err(ModelError::EmptyContract {
                endpoint: self.endpoint,
            });
        }

        let mut methods = IndexMap::with_capacity(self.methods.len());
        for (method, contract) in self.methods {
            if methods.contains_key(&method) {
                return Err(ModelError::DuplicateMethod {
                    endpoint: self.endpoint,
                    method: method.to_string(),
                });
            }
            methods.insert(method, contract);
        }

        Ok(ContractDescriptor {
            endpoint: self.endpoint,
            methods,
            definitions: self.definitions,
        })
    }
}

/// Serde support for method-keyed maps.
mod method_map_serde {
    use std::fmt;

    use http::Method;
    use indexmap::IndexMap;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::MethodContract;

    pub fn serialize<S>(
        methods: &IndexMap<Method, MethodContract>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(methods.len()))?;
        for (method, contract) in methods {
            map.serialize_entry(method.as_str(), contract)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<IndexMap<Method, MethodContract>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MethodMapVisitor)
    }

    struct MethodMapVisitor;

    impl<'de> Visitor<'de> for MethodMapVisitor {
        type Value = IndexMap<Method, MethodContract>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from HTTP method to method contract")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut methods = IndexMap::new();
            while let Some((name, contract)) = access.next_entry::<String, MethodContract>()? {
                let method: Method = name.parse().map_err(serde::de::Error::custom)?;
                if methods.insert(method, contract).is_some() {
                    return Err(serde::de::Error::custom(format!(
                        "method {name} is declared more than once"
                    )));
                }
            }
            Ok(methods)
        }
    }
}
