//! `aegis validate`: check one request file against loaded artifacts.

use std::path::Path;

use aegis_config::RuntimeConfig;
use aegis_sentinel::{ContractRegistry, ValidationResult};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Reads a `{method, query, body}` request from a JSON file.
pub async fn read_request(path: &Path) -> CliResult<Value> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| CliError::io("read", path, e))?;
    serde_json::from_str(&text).map_err(|e| CliError::InvalidRequest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Loads every artifact under the schema root and validates the request in
/// `request_file` for `endpoint`.
///
/// A rejected request is an `Ok` result with `valid == false`; errors are
/// reserved for unreadable inputs, bad artifacts and unknown endpoints.
pub async fn validate(
    runtime: &RuntimeConfig,
    endpoint: &str,
    request_file: &Path,
) -> CliResult<ValidationResult> {
    let request = read_request(request_file).await?;
    let registry =
        ContractRegistry::load_dir(&runtime.schema_root, runtime.validation_config()).await?;
    let result = registry.validate_request(endpoint, &request)?;
    debug!(endpoint, outcome = result.outcome(), "request validated");
    Ok(result)
}
