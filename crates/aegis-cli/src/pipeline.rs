//! Extraction and compilation of every endpoint under an API root.
//!
//! Endpoints are independent, so they are built concurrently: a semaphore
//! bounds how many are in flight and the CPU-bound work runs on the blocking
//! pool. Results come back sorted by endpoint identity whatever order the
//! tasks finish in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aegis_compiler::{artifact_kind, artifact_source, CompiledContract, RenderedContract, SchemaCompiler};
use aegis_config::GeneratorConfig;
use aegis_core::ContractDescriptor;
use aegis_extract::{discover_endpoints, find_files, load_shared_types, ContractExtractor, EndpointSource};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// File extension shared by both schema artifacts.
const ARTIFACT_EXTENSION: &str = "json";

/// Everything produced for one endpoint.
#[derive(Debug, Clone)]
pub struct ContractBuild {
    /// Extracted descriptor.
    pub descriptor: ContractDescriptor,
    /// Compiled documents.
    pub compiled: CompiledContract,
    /// Artifact text, as it would be written.
    pub rendered: RenderedContract,
}

/// Outcome of building one discovered endpoint.
#[derive(Debug)]
pub struct EndpointBuild {
    /// The endpoint source file.
    pub source: EndpointSource,
    /// The build, or why it failed.
    pub outcome: CliResult<ContractBuild>,
    /// Time spent extracting and compiling.
    pub elapsed: Duration,
}

/// Builds contracts for the endpoints under one API root.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: Arc<ContractExtractor>,
    config: GeneratorConfig,
}

impl Pipeline {
    /// Loads shared types from the configured type directories.
    pub async fn load(config: &GeneratorConfig) -> CliResult<Self> {
        let dirs = config.type_dirs.clone();
        let extension = config.types_extension.clone();
        let shared = blocking(move || Ok(load_shared_types(&dirs, &extension)?)).await?;
        debug!(types = shared.len(), "shared types loaded");
        Ok(Self::new(ContractExtractor::new(shared), config.clone()))
    }

    /// Creates a pipeline around an existing extractor.
    pub fn new(extractor: ContractExtractor, config: GeneratorConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            config,
        }
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Finds every endpoint source under the API root.
    pub async fn discover(&self) -> CliResult<Vec<EndpointSource>> {
        let root = self.config.api_root.clone();
        let extension = self.config.source_extension.clone();
        blocking(move || Ok(discover_endpoints(&root, &extension)?)).await
    }

    /// Finds the source of one endpoint.
    pub async fn find(&self, endpoint: &str) -> CliResult<EndpointSource> {
        self.discover()
            .await?
            .into_iter()
            .find(|source| source.endpoint == endpoint)
            .ok_or_else(|| CliError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
                root: self.config.api_root.clone(),
            })
    }

    /// Builds one endpoint on the blocking pool.
    pub async fn build(&self, source: EndpointSource) -> CliResult<ContractBuild> {
        let extractor = Arc::clone(&self.extractor);
        blocking(move || build_contract(&extractor, &source)).await
    }

    /// Builds every endpoint, at most `concurrency` at a time.
    ///
    /// A failing endpoint does not stop the others; its error is kept in its
    /// [`EndpointBuild`]. That includes a build task that panics.
    pub async fn build_all(&self, sources: Vec<EndpointSource>) -> CliResult<Vec<EndpointBuild>> {
        let extractor = Arc::clone(&self.extractor);
        self.run_all(sources, move |source| build_contract(&extractor, source))
            .await
    }

    async fn run_all<F>(&self, sources: Vec<EndpointSource>, work: F) -> CliResult<Vec<EndpointBuild>>
    where
        F: Fn(&EndpointSource) -> CliResult<ContractBuild> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();

        for source in sources {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| CliError::Task(e.to_string()))?;
            let work = Arc::clone(&work);
            let task_source = source.clone();

            let handle = tasks.spawn(async move {
                let _permit = permit;
                let started = Instant::now();
                let blocking_source = task_source.clone();
                let outcome = blocking(move || work(&blocking_source)).await;
                EndpointBuild {
                    source: task_source,
                    outcome,
                    elapsed: started.elapsed(),
                }
            });
            in_flight.insert(handle.id(), source);
        }

        let mut builds = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, build)) => {
                    in_flight.remove(&id);
                    builds.push(build);
                }
                Err(e) => {
                    if let Some(source) = in_flight.remove(&e.id()) {
                        warn!(endpoint = %source.endpoint, error = %e, "build task failed");
                        builds.push(EndpointBuild {
                            source,
                            outcome: Err(CliError::Task(e.to_string())),
                            elapsed: Duration::ZERO,
                        });
                    }
                }
            }
        }
        builds.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(builds)
    }

    /// Artifacts under the API root whose source file no longer exists.
    pub async fn find_orphans(&self) -> CliResult<Vec<PathBuf>> {
        let root = self.config.api_root.clone();
        let extension = self.config.source_extension.clone();
        blocking(move || {
            Ok(find_files(&root, ARTIFACT_EXTENSION)?
                .into_iter()
                .filter(|path| artifact_kind(path).is_some())
                .filter(|path| {
                    artifact_source(path, &extension).is_some_and(|source| !source.exists())
                })
                .collect())
        })
        .await
    }

    /// Endpoint identity an artifact path belongs to.
    pub fn artifact_endpoint(&self, artifact: &Path) -> Option<String> {
        let source = artifact_source(artifact, &self.config.source_extension)?;
        EndpointSource::from_path(&self.config.api_root, &source).map(|source| source.endpoint)
    }
}

fn build_contract(extractor: &ContractExtractor, source: &EndpointSource) -> CliResult<ContractBuild> {
    let descriptor = extractor.extract_file(source)?;
    let compiled = SchemaCompiler::new().compile(&descriptor)?;
    let rendered = compiled.render()?;
    Ok(ContractBuild {
        descriptor,
        compiled,
        rendered,
    })
}

async fn blocking<T, F>(work: F) -> CliResult<T>
where
    F: FnOnce() -> CliResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CliError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MESSAGE_CONTRACT: &str = r#"
        type MessageQuery = { messageID: string };
        export default
            | { method: "DELETE", query: MessageQuery }
            | { method: "PATCH", query: MessageQuery, body: { content: string @minLength(1) @maxLength(20000) } };
    "#;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn pipeline(root: &Path, concurrency: usize) -> Pipeline {
        Pipeline::new(
            ContractExtractor::default(),
            GeneratorConfig {
                api_root: root.to_path_buf(),
                concurrency,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_build_all_sorted_and_isolated() {
        let dir = TempDir::new().unwrap();
        for i in 0..6 {
            write(
                dir.path(),
                &format!("things/{i}/index.contract"),
                "export default { method: \"GET\" };",
            );
        }
        write(dir.path(), "broken/index.contract", "export default {");
        write(
            dir.path(),
            "messages/[messageID]/index.contract",
            MESSAGE_CONTRACT,
        );

        let pipeline = pipeline(dir.path(), 2);
        let sources = pipeline.discover().await.unwrap();
        let builds = pipeline.build_all(sources).await.unwrap();

        let endpoints: Vec<&str> = builds.iter().map(|b| b.source.endpoint.as_str()).collect();
        let mut sorted = endpoints.clone();
        sorted.sort_unstable();
        assert_eq!(endpoints, sorted);
        assert_eq!(builds.len(), 8);

        let failed: Vec<&str> = builds
            .iter()
            .filter(|b| b.outcome.is_err())
            .map(|b| b.source.endpoint.as_str())
            .collect();
        assert_eq!(failed, vec!["broken/index"]);

        let message = builds
            .iter()
            .find(|b| b.source.endpoint == "messages/[messageID]/index")
            .unwrap();
        let build = message.outcome.as_ref().unwrap();
        assert_eq!(build.descriptor.method_names(), vec!["DELETE", "PATCH"]);
    }

    #[tokio::test]
    async fn test_panicking_build_is_isolated() {
        let dir = TempDir::new().unwrap();
        for name in ["alpha", "beta", "gamma"] {
            write(
                dir.path(),
                &format!("{name}/index.contract"),
                "export default { method: \"GET\" };",
            );
        }

        let pipeline = pipeline(dir.path(), 2);
        let sources = pipeline.discover().await.unwrap();
        let extractor = Arc::new(ContractExtractor::default());
        let builds = pipeline
            .run_all(sources, move |source| {
                assert_ne!(source.endpoint, "beta/index", "extractor crashed");
                build_contract(&extractor, source)
            })
            .await
            .unwrap();

        assert_eq!(builds.len(), 3);
        let outcomes: Vec<(&str, bool)> = builds
            .iter()
            .map(|b| (b.source.endpoint.as_str(), b.outcome.is_ok()))
            .collect();
        assert_eq!(
            outcomes,
            vec![("alpha/index", true), ("beta/index", false), ("gamma/index", true)]
        );
        assert!(matches!(builds[1].outcome, Err(CliError::Task(_))));
    }

    #[tokio::test]
    async fn test_find_endpoint() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "messages/[messageID]/index.contract",
            MESSAGE_CONTRACT,
        );
        let pipeline = pipeline(dir.path(), 4);

        let source = pipeline.find("messages/[messageID]/index").await.unwrap();
        assert!(source.path.ends_with("index.contract"));

        let err = pipeline.find("users/index").await.unwrap_err();
        assert!(matches!(err, CliError::UnknownEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_find_orphans() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "kept/index.contract", "export default { method: \"GET\" };");
        write(dir.path(), "kept/index.method.schema.json", "{}");
        write(dir.path(), "gone/index.method.schema.json", "{}");
        write(dir.path(), "gone/index.request.schema.json", "{}");
        write(dir.path(), ".hidden/index.method.schema.json", "{}");

        let pipeline = pipeline(dir.path(), 4);
        let orphans = pipeline.find_orphans().await.unwrap();
        assert_eq!(
            orphans,
            vec![
                dir.path().join("gone/index.method.schema.json"),
                dir.path().join("gone/index.request.schema.json"),
            ]
        );
        assert_eq!(
            pipeline.artifact_endpoint(&orphans[0]).as_deref(),
            Some("gone/index")
        );
    }

    #[tokio::test]
    async fn test_load_with_shared_types() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "types/common.types", "type Id = string @minLength(1);");
        write(
            dir.path(),
            "api/users/index.contract",
            "export default { method: \"GET\", query: { id: Id } };",
        );

        let config = GeneratorConfig {
            api_root: dir.path().join("api"),
            type_dirs: vec![dir.path().join("types")],
            ..Default::default()
        };
        let pipeline = Pipeline::load(&config).await.unwrap();
        let source = pipeline.find("users/index").await.unwrap();
        let build = pipeline.build(source).await.unwrap();
        assert_eq!(build.compiled.endpoint, "users/index");
    }

    #[tokio::test]
    async fn test_missing_api_root() {
        let pipeline = pipeline(Path::new("/nonexistent/aegis/api"), 4);
        assert!(pipeline.discover().await.is_err());
    }
}
