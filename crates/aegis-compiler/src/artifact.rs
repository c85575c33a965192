//! Artifact rendering and file naming.
//!
//! Artifacts live next to the endpoint file they were generated from:
//! `index.contract` produces `index.method.schema.json` and
//! `index.request.schema.json` in the same directory.

use std::path::{Path, PathBuf};

use aegis_core::{SchemaArtifact, SchemaKind};

/// Renders an artifact as pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns the serializer error, which only happens for non-finite numbers.
pub fn render_artifact(artifact: &SchemaArtifact) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(artifact)?;
    text.push('\n');
    Ok(text)
}

/// Returns the artifact path for an endpoint source file.
pub fn artifact_path(source: &Path, kind: SchemaKind) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{}", kind.suffix()))
}

/// Returns which artifact kind a path names, judging by its suffix.
pub fn artifact_kind(path: &Path) -> Option<SchemaKind> {
    let name = path.file_name()?.to_str()?;
    [SchemaKind::Method, SchemaKind::Request]
        .into_iter()
        .find(|kind| name.ends_with(kind.suffix()) && name.len() > kind.suffix().len())
}

/// Returns the endpoint source file an artifact was generated from.
pub fn artifact_source(path: &Path, source_extension: &str) -> Option<PathBuf> {
    let kind = artifact_kind(path)?;
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(kind.suffix())?;
    Some(path.with_file_name(format!("{stem}.{source_extension}")))
}
