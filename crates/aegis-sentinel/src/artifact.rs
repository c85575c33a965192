//! Artifact loading.
//!
//! Schema artifacts are read once at startup. A file that cannot be read or
//! parsed, or that carries an unknown format tag, fails the load; nothing is
//! skipped silently.

use std::path::{Path, PathBuf};

use aegis_core::{SchemaArtifact, SchemaKind};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{SentinelError, SentinelResult};

/// Loads artifacts from files and directories.
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Load an artifact from a file.
    pub async fn from_file(path: impl AsRef<Path>) -> SentinelResult<SchemaArtifact> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading artifact from file");

        let content = fs::read_to_string(path).await.map_err(|e| {
            SentinelError::ArtifactLoad(format!(
                "failed to read artifact file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            SentinelError::ArtifactParse(msg) => {
                SentinelError::ArtifactParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load an artifact from JSON string.
    pub fn from_json(json: &str) -> SentinelResult<SchemaArtifact> {
        let artifact: SchemaArtifact = serde_json::from_str(json)
            .map_err(|e| SentinelError::ArtifactParse(e.to_string()))?;

        artifact
            .check_format()
            .map_err(|source| SentinelError::InvalidArtifact {
                endpoint: artifact.endpoint.clone(),
                source,
            })?;

        Ok(artifact)
    }

    /// Load every artifact under `root`, in path order.
    pub async fn load_dir(root: impl AsRef<Path>) -> SentinelResult<Vec<SchemaArtifact>> {
        let root = root.as_ref();
        let paths = find_artifacts(root).await?;

        let mut artifacts = Vec::with_capacity(paths.len());
        for path in &paths {
            artifacts.push(Self::from_file(path).await?);
        }

        info!(
            root = %root.display(),
            artifacts = artifacts.len(),
            "artifacts loaded"
        );
        Ok(artifacts)
    }
}

/// Returns which artifact kind a file name denotes, if any.
pub fn artifact_kind(path: &Path) -> Option<SchemaKind> {
    let name = path.file_name()?.to_str()?;
    [SchemaKind::Method, SchemaKind::Request]
        .into_iter()
        .find(|kind| name.len() > kind.suffix().len() && name.ends_with(kind.suffix()))
}

async fn find_artifacts(root: &Path) -> SentinelResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            SentinelError::ArtifactLoad(format!(
                "failed to read directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if artifact_kind(&path).is_some() {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}
