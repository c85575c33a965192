//! `aegis generate`: write artifacts for every endpoint.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aegis_compiler::{artifact_path, RenderedContract};
use aegis_config::GeneratorConfig;
use aegis_core::SchemaKind;
use aegis_telemetry::metrics::record_generation;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{CliError, CliResult};
use crate::pipeline::Pipeline;

/// What happened to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateOutcome {
    /// At least one artifact was created or rewritten.
    Written,
    /// Both artifacts already matched.
    Unchanged,
    /// Extraction, compilation or writing failed; old artifacts are removed.
    Failed,
}

impl GenerateOutcome {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
        }
    }
}

/// Generation result for one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    /// Endpoint identity.
    pub endpoint: String,
    /// Outcome.
    pub outcome: GenerateOutcome,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a whole generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
    /// One entry per discovered endpoint, sorted by identity.
    pub endpoints: Vec<EndpointReport>,
    /// Orphaned artifacts that were deleted.
    pub pruned: Vec<PathBuf>,
}

impl GenerateReport {
    /// Number of endpoints with the given outcome.
    pub fn count(&self, outcome: GenerateOutcome) -> usize {
        self.endpoints.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Endpoints that failed.
    pub fn failures(&self) -> impl Iterator<Item = &EndpointReport> {
        self.endpoints
            .iter()
            .filter(|e| e.outcome == GenerateOutcome::Failed)
    }

    /// Whether any endpoint failed.
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} endpoints: {} written, {} unchanged, {} failed",
            self.endpoints.len(),
            self.count(GenerateOutcome::Written),
            self.count(GenerateOutcome::Unchanged),
            self.count(GenerateOutcome::Failed),
        )?;
        for failure in self.failures() {
            writeln!(
                f,
                "  failed {}\n    {}",
                failure.endpoint,
                failure.error.as_deref().unwrap_or("unknown error")
            )?;
        }
        for path in &self.pruned {
            writeln!(f, "  pruned {}", path.display())?;
        }
        Ok(())
    }
}

/// Extracts, compiles and writes artifacts for every endpoint under the API
/// root.
///
/// Per-endpoint failures are reported, not returned: the batch always runs to
/// the end. The returned error covers problems that stop the whole run, such
/// as an unreadable API root or an invalid shared type file.
pub async fn generate(config: &GeneratorConfig) -> CliResult<GenerateReport> {
    let pipeline = Pipeline::load(config).await?;
    let sources = pipeline.discover().await?;
    info!(
        root = %config.api_root.display(),
        endpoints = sources.len(),
        "generating artifacts"
    );

    let mut report = GenerateReport::default();
    for build in pipeline.build_all(sources).await? {
        let endpoint = build.source.endpoint.clone();
        let written = match build.outcome {
            Ok(contract) => write_artifacts(&build.source.path, &contract.rendered).await,
            Err(e) => Err(e),
        };

        let entry = match written {
            Ok(true) => {
                info!(endpoint = %endpoint, "artifacts written");
                EndpointReport {
                    endpoint,
                    outcome: GenerateOutcome::Written,
                    error: None,
                }
            }
            Ok(false) => EndpointReport {
                endpoint,
                outcome: GenerateOutcome::Unchanged,
                error: None,
            },
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "endpoint failed");
                if let Err(remove) = remove_artifacts(&build.source.path).await {
                    warn!(endpoint = %endpoint, error = %remove, "stale artifacts left in place");
                }
                EndpointReport {
                    endpoint,
                    outcome: GenerateOutcome::Failed,
                    error: Some(e.to_string()),
                }
            }
        };
        record_generation(entry.outcome.as_str(), build.elapsed);
        report.endpoints.push(entry);
    }

    if config.prune_orphans {
        for path in pipeline.find_orphans().await? {
            fs::remove_file(&path)
                .await
                .map_err(|e| CliError::io("remove", &path, e))?;
            info!(path = %path.display(), "orphaned artifact removed");
            report.pruned.push(path);
        }
    }

    info!(
        written = report.count(GenerateOutcome::Written),
        unchanged = report.count(GenerateOutcome::Unchanged),
        failed = report.count(GenerateOutcome::Failed),
        pruned = report.pruned.len(),
        "generation finished"
    );
    Ok(report)
}

/// Writes both artifacts next to `source`, skipping files whose content
/// already matches. Returns whether anything was written.
async fn write_artifacts(source: &Path, rendered: &RenderedContract) -> CliResult<bool> {
    let mut changed = false;
    for kind in [SchemaKind::Method, SchemaKind::Request] {
        let path = artifact_path(source, kind);
        let text = rendered.get(kind);
        if fs::read_to_string(&path).await.is_ok_and(|existing| existing == text) {
            continue;
        }
        fs::write(&path, text)
            .await
            .map_err(|e| CliError::io("write", &path, e))?;
        changed = true;
    }
    Ok(changed)
}

/// Deletes both artifacts of `source`, if present.
async fn remove_artifacts(source: &Path) -> CliResult<()> {
    for kind in [SchemaKind::Method, SchemaKind::Request] {
        let path = artifact_path(source, kind);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CliError::io("remove", &path, e)),
        }
    }
    Ok(())
}
