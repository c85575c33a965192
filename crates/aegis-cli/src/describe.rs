//! `aegis describe`: show what one endpoint compiles to.

use std::path::PathBuf;

use aegis_config::GeneratorConfig;
use aegis_core::SchemaDocument;
use serde::Serialize;

use crate::error::CliResult;
use crate::pipeline::Pipeline;

/// Compiled view of one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDescription {
    /// Endpoint identity.
    pub endpoint: String,
    /// Source file.
    pub source: PathBuf,
    /// Allowed methods in declaration order.
    pub methods: Vec<String>,
    /// Method schema document.
    pub method_schema: SchemaDocument,
    /// Request schema document.
    pub request_schema: SchemaDocument,
}

/// Extracts and compiles one endpoint from source without writing anything.
pub async fn describe(config: &GeneratorConfig, endpoint: &str) -> CliResult<EndpointDescription> {
    let pipeline = Pipeline::load(config).await?;
    let source = pipeline.find(endpoint).await?;
    let path = source.path.clone();
    let build = pipeline.build(source).await?;

    Ok(EndpointDescription {
        endpoint: build.compiled.endpoint,
        source: path,
        methods: build
            .descriptor
            .method_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        method_schema: build.compiled.method_schema,
        request_schema: build.compiled.request_schema,
    })
}
