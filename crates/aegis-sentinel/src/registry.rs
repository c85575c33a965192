//! Endpoint registry.
//!
//! The registry is built once at startup and never changes afterwards, so it
//! can be shared behind an `Arc` by every request handler.

use std::collections::BTreeMap;
use std::path::Path;

use aegis_core::{SchemaArtifact, SchemaDocument, SchemaKind};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifact::ArtifactLoader;
use crate::config::ValidationConfig;
use crate::endpoint::EndpointValidator;
use crate::error::{SentinelError, SentinelResult};
use crate::validation::ValidationResult;

/// Counter of validation calls by endpoint and outcome.
pub const VALIDATIONS_TOTAL: &str = "aegis_validations_total";

/// `endpoint` label recorded for requests naming no registered endpoint.
///
/// The caller-supplied identity only appears in the log event, so the set of
/// label values stays bounded by the registry.
pub const UNKNOWN_ENDPOINT_LABEL: &str = "unknown";

/// Endpoint identity to validator.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    endpoints: BTreeMap<String, EndpointValidator>,
    config: ValidationConfig,
}

impl ContractRegistry {
    /// Build a registry from in-memory documents.
    pub fn from_documents<I, S>(documents: I, config: ValidationConfig) -> SentinelResult<Self>
    where
        I: IntoIterator<Item = (S, SchemaDocument, SchemaDocument)>,
        S: Into<String>,
    {
        let mut endpoints = BTreeMap::new();
        for (endpoint, method_schema, request_schema) in documents {
            let validator = EndpointValidator::new(endpoint, method_schema, request_schema, config)?;
            let endpoint = validator.endpoint().to_string();
            if endpoints.contains_key(&endpoint) {
                return Err(SentinelError::DuplicateArtifact {
                    endpoint,
                    kind: SchemaKind::Request,
                });
            }
            endpoints.insert(endpoint, validator);
        }
        Ok(Self { endpoints, config })
    }

    /// Build a registry from loaded artifacts, pairing them by endpoint.
    pub fn from_artifacts<I>(artifacts: I, config: ValidationConfig) -> SentinelResult<Self>
    where
        I: IntoIterator<Item = SchemaArtifact>,
    {
        let mut pairs: BTreeMap<String, (Option<SchemaDocument>, Option<SchemaDocument>)> =
            BTreeMap::new();

        for artifact in artifacts {
            artifact
                .check_format()
                .map_err(|source| SentinelError::InvalidArtifact {
                    endpoint: artifact.endpoint.clone(),
                    source,
                })?;

            let slots = pairs.entry(artifact.endpoint.clone()).or_default();
            let slot = match artifact.kind {
                SchemaKind::Method => &mut slots.0,
                SchemaKind::Request => &mut slots.1,
            };
            if slot.is_some() {
                return Err(SentinelError::DuplicateArtifact {
                    endpoint: artifact.endpoint,
                    kind: artifact.kind,
                });
            }
            *slot = Some(artifact.document);
        }

        let mut documents = Vec::with_capacity(pairs.len());
        for (endpoint, pair) in pairs {
            match pair {
                (Some(method_schema), Some(request_schema)) => {
                    documents.push((endpoint, method_schema, request_schema));
                }
                (None, _) => {
                    return Err(SentinelError::IncompleteEndpoint {
                        endpoint,
                        missing: SchemaKind::Method,
                    })
                }
                (_, None) => {
                    return Err(SentinelError::IncompleteEndpoint {
                        endpoint,
                        missing: SchemaKind::Request,
                    })
                }
            }
        }

        Self::from_documents(documents, config)
    }

    /// Load every artifact under `root` and build a registry.
    pub async fn load_dir(root: impl AsRef<Path>, config: ValidationConfig) -> SentinelResult<Self> {
        let root = root.as_ref();
        let artifacts = ArtifactLoader::load_dir(root).await?;
        let registry = Self::from_artifacts(artifacts, config)?;

        info!(
            root = %root.display(),
            endpoints = registry.len(),
            "contract registry loaded"
        );
        Ok(registry)
    }

    /// Validator for an endpoint.
    pub fn get(&self, endpoint: &str) -> Option<&EndpointValidator> {
        self.endpoints.get(endpoint)
    }

    /// Registered endpoint identities, sorted.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// The configuration every validator was built with.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a request given as its parts.
    ///
    /// An unknown endpoint is an error rather than a pass.
    pub fn validate(
        &self,
        endpoint: &str,
        method: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> SentinelResult<ValidationResult> {
        let validator = self.lookup(endpoint)?;
        let result = validator.validate(method, query, body);
        record(endpoint, &result);
        Ok(result)
    }

    /// Validate a whole `{method, query, body}` request value.
    pub fn validate_request(
        &self,
        endpoint: &str,
        request: &Value,
    ) -> SentinelResult<ValidationResult> {
        let validator = self.lookup(endpoint)?;
        let result = validator.validate_request(request);
        record(endpoint, &result);
        Ok(result)
    }

    fn lookup(&self, endpoint: &str) -> SentinelResult<&EndpointValidator> {
        self.endpoints.get(endpoint).ok_or_else(|| {
            warn!(endpoint, "validation requested for unknown endpoint");
            counter!(
                VALIDATIONS_TOTAL,
                "endpoint" => UNKNOWN_ENDPOINT_LABEL,
                "outcome" => "unknown_endpoint"
            )
            .increment(1);
            SentinelError::EndpointNotFound {
                endpoint: endpoint.to_string(),
            }
        })
    }
}

fn record(endpoint: &str, result: &ValidationResult) {
    let outcome = result.outcome();
    if !result.valid {
        debug!(
            endpoint,
            outcome,
            errors = result.errors.len(),
            "request rejected"
        );
    }
    counter!(
        VALIDATIONS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
