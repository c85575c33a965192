//! `aegis check`: the stale-contract gate.
//!
//! Every endpoint is rebuilt in memory and compared byte for byte with the
//! artifacts on disk. Nothing is written.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use aegis_compiler::artifact_path;
use aegis_config::GeneratorConfig;
use aegis_core::SchemaKind;
use aegis_telemetry::metrics::record_stale_contract;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{CliError, CliResult};
use crate::pipeline::Pipeline;

/// Why an endpoint's artifacts are out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleStatus {
    /// The artifact does not exist.
    Missing,
    /// The artifact differs from a fresh compile.
    Differs,
    /// The artifact's source file no longer exists.
    Orphaned,
    /// The source no longer extracts or compiles.
    Failed,
}

impl StaleStatus {
    /// Label used in reports and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Differs => "differs",
            Self::Orphaned => "orphaned",
            Self::Failed => "failed",
        }
    }
}

/// One out-of-date artifact or endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleContract {
    /// Endpoint identity.
    pub endpoint: String,
    /// Artifact path, or the source path for a failed endpoint.
    pub path: PathBuf,
    /// What is wrong.
    pub status: StaleStatus,
    /// Failure message for [`StaleStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl fmt::Display for StaleContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status.as_str(),
            self.endpoint,
            self.path.display()
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Result of a check run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// Number of endpoint sources checked.
    pub checked: usize,
    /// Drift found, sorted by endpoint then path.
    pub stale: Vec<StaleContract>,
}

impl CheckReport {
    /// Whether every artifact matches its source.
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
    }

    fn stale_endpoints(&self) -> usize {
        let mut endpoints: Vec<&str> = self.stale.iter().map(|s| s.endpoint.as_str()).collect();
        endpoints.dedup();
        endpoints.len()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "{} endpoints up to date", self.checked);
        }
        writeln!(
            f,
            "{} of {} endpoints have stale contracts; run `aegis generate`",
            self.stale_endpoints(),
            self.checked
        )?;
        for stale in &self.stale {
            writeln!(f, "  {stale}")?;
        }
        Ok(())
    }
}

/// Compares on-disk artifacts with a fresh compile of every endpoint.
pub async fn check(config: &GeneratorConfig) -> CliResult<CheckReport> {
    let pipeline = Pipeline::load(config).await?;
    let sources = pipeline.discover().await?;
    let mut report = CheckReport {
        checked: sources.len(),
        stale: Vec::new(),
    };

    for build in pipeline.build_all(sources).await? {
        let endpoint = build.source.endpoint;
        let contract = match build.outcome {
            Ok(contract) => contract,
            Err(e) => {
                report.stale.push(StaleContract {
                    endpoint,
                    path: build.source.path,
                    status: StaleStatus::Failed,
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };

        for kind in [SchemaKind::Method, SchemaKind::Request] {
            let path = artifact_path(&build.source.path, kind);
            let status = match fs::read_to_string(&path).await {
                Ok(existing) if existing == contract.rendered.get(kind) => continue,
                Ok(_) => StaleStatus::Differs,
                Err(e) if e.kind() == ErrorKind::NotFound => StaleStatus::Missing,
                Err(e) => return Err(CliError::io("read", &path, e)),
            };
            report.stale.push(StaleContract {
                endpoint: endpoint.clone(),
                path,
                status,
                detail: None,
            });
        }
    }

    for path in pipeline.find_orphans().await? {
        let endpoint = pipeline
            .artifact_endpoint(&path)
            .unwrap_or_else(|| path.display().to_string());
        report.stale.push(StaleContract {
            endpoint,
            path,
            status: StaleStatus::Orphaned,
            detail: None,
        });
    }

    report
        .stale
        .sort_by(|a, b| (&a.endpoint, &a.path).cmp(&(&b.endpoint, &b.path)));

    for stale in &report.stale {
        warn!(
            endpoint = %stale.endpoint,
            path = %stale.path.display(),
            status = stale.status.as_str(),
            "stale contract"
        );
        record_stale_contract(stale.status.as_str());
    }
    info!(
        checked = report.checked,
        stale = report.stale.len(),
        "check finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_contract_display() {
        let stale = StaleContract {
            endpoint: "users/index".to_string(),
            path: PathBuf::from("api/users/index.request.schema.json"),
            status: StaleStatus::Differs,
            detail: None,
        };
        assert_eq!(
            stale.to_string(),
            "differs users/index: api/users/index.request.schema.json"
        );

        let failed = StaleContract {
            status: StaleStatus::Failed,
            detail: Some("bad syntax".to_string()),
            ..stale
        };
        assert!(failed.to_string().ends_with(" (bad syntax)"));
    }

    #[test]
    fn test_report_display() {
        let clean = CheckReport {
            checked: 3,
            stale: Vec::new(),
        };
        assert!(clean.is_clean());
        assert_eq!(clean.to_string(), "3 endpoints up to date\n");

        let stale = CheckReport {
            checked: 3,
            stale: vec![
                StaleContract {
                    endpoint: "a/index".to_string(),
                    path: PathBuf::from("a/index.method.schema.json"),
                    status: StaleStatus::Missing,
                    detail: None,
                },
                StaleContract {
                    endpoint: "a/index".to_string(),
                    path: PathBuf::from("a/index.request.schema.json"),
                    status: StaleStatus::Missing,
                    detail: None,
                },
            ],
        };
        assert!(!stale.is_clean());
        assert!(stale
            .to_string()
            .starts_with("1 of 3 endpoints have stale contracts"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(StaleStatus::Orphaned).unwrap(),
            serde_json::json!("orphaned")
        );
    }
}
