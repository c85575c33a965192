//! Per-endpoint validation: method gate, then request shape.

use aegis_core::{PrimitiveKind, SchemaDocument, ShapeNode};
use serde_json::{Map, Value};

use crate::config::ValidationConfig;
use crate::error::{SentinelError, SentinelResult};
use crate::validation::{SchemaValidator, ValidationResult};

/// Validates requests for one endpoint.
///
/// Holds the endpoint's method schema and request schema. A request is first
/// checked against the method schema; only an allowed method proceeds to the
/// full `{method, query, body}` check.
#[derive(Debug, Clone)]
pub struct EndpointValidator {
    endpoint: String,
    allowed: Vec<String>,
    methods: SchemaValidator,
    requests: SchemaValidator,
}

impl EndpointValidator {
    /// Create a validator from the endpoint's two documents.
    pub fn new(
        endpoint: impl Into<String>,
        method_schema: SchemaDocument,
        request_schema: SchemaDocument,
        config: ValidationConfig,
    ) -> SentinelResult<Self> {
        let endpoint = endpoint.into();
        let methods = SchemaValidator::new(&endpoint, method_schema, config)?;
        let requests = SchemaValidator::new(&endpoint, request_schema, config)?;

        let allowed = methods
            .document()
            .root_shape()
            .map(|root| methods.document().resolve(root))
            .filter(|shape| {
                matches!(
                    shape,
                    ShapeNode::Primitive {
                        kind: PrimitiveKind::String,
                        ..
                    }
                )
            })
            .and_then(ShapeNode::enum_values)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .ok_or_else(|| SentinelError::MalformedMethodSchema {
                endpoint: endpoint.clone(),
            })?;

        Ok(Self {
            endpoint,
            allowed,
            methods,
            requests,
        })
    }

    /// Endpoint identity.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Allowed methods in declaration order.
    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed
    }

    /// Whether `method` passes the method gate.
    pub fn allows(&self, method: &str) -> bool {
        self.methods.is_valid(&Value::String(method.to_string()))
    }

    /// The method schema.
    pub fn method_schema(&self) -> &SchemaDocument {
        self.methods.document()
    }

    /// The request schema.
    pub fn request_schema(&self) -> &SchemaDocument {
        self.requests.document()
    }

    /// Validate a request given as its parts.
    ///
    /// `None` means the slot was not sent at all, which differs from an
    /// explicit `null`.
    pub fn validate(
        &self,
        method: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> ValidationResult {
        let mut request = Map::new();
        request.insert("method".to_string(), Value::String(method.to_string()));
        if let Some(query) = query {
            request.insert("query".to_string(), query.clone());
        }
        if let Some(body) = body {
            request.insert("body".to_string(), body.clone());
        }
        self.validate_request(&Value::Object(request))
    }

    /// Validate a whole `{method, query, body}` request value.
    pub fn validate_request(&self, request: &Value) -> ValidationResult {
        let method = request.get("method").unwrap_or(&Value::Null);
        if !self.methods.is_valid(method) {
            return ValidationResult::method_not_allowed();
        }
        ValidationResult::from_errors(self.requests.validate(request))
    }
}
