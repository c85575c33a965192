//! Endpoint and shared-type discovery on disk.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ExtractionError, ExtractionResult};
use crate::extractor::SharedTypes;

/// An endpoint declaration file found under the API root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointSource {
    /// Endpoint identity: the path relative to the root, without extension,
    /// with `/` separators.
    pub endpoint: String,
    /// Path of the declaration file.
    pub path: PathBuf,
}

impl EndpointSource {
    /// Creates an endpoint source for `path` relative to `root`.
    ///
    /// Returns `None` when `path` is not under `root` or has no file stem.
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let stem = relative.file_stem()?.to_str()?;
        let mut segments: Vec<&str> = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        segments.push(stem);
        Some(Self {
            endpoint: segments.join("/"),
            path: path.to_path_buf(),
        })
    }
}

/// Finds every file with `extension` under `root`, sorted by endpoint.
///
/// Entries whose name starts with `.` are skipped.
///
/// # Errors
///
/// Returns [`ExtractionError::Io`] when a directory cannot be read.
pub fn discover_endpoints(root: &Path, extension: &str) -> ExtractionResult<Vec<EndpointSource>> {
    let mut endpoints: Vec<EndpointSource> = find_files(root, extension)?
        .into_iter()
        .filter_map(|path| EndpointSource::from_path(root, &path))
        .collect();
    endpoints.sort();
    debug!(root = %root.display(), count = endpoints.len(), "discovered endpoints");
    Ok(endpoints)
}

/// Loads every shared declaration file with `extension` under `dirs`.
///
/// # Errors
///
/// Returns [`ExtractionError::Io`] for unreadable files and
/// [`ExtractionError::SharedTypes`] for invalid ones.
pub fn load_shared_types(dirs: &[PathBuf], extension: &str) -> ExtractionResult<SharedTypes> {
    let mut shared = SharedTypes::new();
    for dir in dirs {
        for path in find_files(dir, extension)? {
            let source =
                std::fs::read_to_string(&path).map_err(|e| ExtractionError::io(&path, e))?;
            shared.add_source(&path, &source)?;
        }
    }
    debug!(types = shared.len(), "loaded shared types");
    Ok(shared)
}

/// Walks `root` and returns files ending in `.extension`, sorted by path.
///
/// Entries whose name starts with `.` are skipped, directories included.
pub fn find_files(root: &Path, extension: &str) -> ExtractionResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| ExtractionError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ExtractionError::io(&dir, e))?;
            let path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().map_err(|e| ExtractionError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && path.extension().is_some_and(|ext| ext == extension)
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_endpoint_identity() {
        let root = Path::new("/api");
        let source =
            EndpointSource::from_path(root, Path::new("/api/messages/[messageID]/index.contract"))
                .unwrap();
        assert_eq!(source.endpoint, "messages/[messageID]/index");
        assert!(EndpointSource::from_path(root, Path::new("/elsewhere/a.contract")).is_none());
    }

    #[test]
    fn test_discover_endpoints_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "users/index.contract", "");
        write(dir.path(), "messages/[messageID]/index.contract", "");
        write(dir.path(), "messages/README.md", "");
        write(dir.path(), ".hidden/secret.contract", "");

        let found = discover_endpoints(dir.path(), "contract").unwrap();
        let endpoints: Vec<_> = found.iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["messages/[messageID]/index", "users/index"]);
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = discover_endpoints(&dir.path().join("missing"), "contract").unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }

    #[test]
    fn test_load_shared_types() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "common.types", "type Id = string;");
        write(dir.path(), "nested/more.types", "type Count = integer;");

        let shared = load_shared_types(&[dir.path().to_path_buf()], "types").unwrap();
        assert_eq!(shared.len(), 2);
        assert!(shared.env().contains("Count"));
    }

    #[test]
    fn test_load_shared_types_reports_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.types", "type Id = string;");
        write(dir.path(), "b.types", "type Id = number;");

        let err = load_shared_types(&[dir.path().to_path_buf()], "types").unwrap_err();
        match err {
            ExtractionError::SharedTypes { path, .. } => assert!(path.ends_with("b.types")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
