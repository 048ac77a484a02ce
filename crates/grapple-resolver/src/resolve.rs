//! Public façade: project manifest detection, the resolve pipeline, and
//! bulk artifact download.

use std::path::Path;
use std::sync::Arc;

use grapple_core::artifact::Artifact;
use grapple_core::events::{EventSink, LogSink};
use grapple_core::gradle;
use grapple_core::repository::Repository;
use grapple_maven::registry::RepositoryRegistry;
use grapple_maven::{checksum, download, effective, pom};
use grapple_util::errors::GrappleError;

use crate::cache::ResolverCache;
use crate::conflict::{self, ConflictReport};
use crate::graph::ResolvedGraph;
use crate::walker::{self, ResolveContext, DEFAULT_PARALLELISM};

/// The full outcome of one resolution: the walk graph, the reconciled
/// artifact list, and the conflicts the reconciliation settled.
pub struct Resolution {
    pub graph: ResolvedGraph,
    pub artifacts: Vec<Artifact>,
    pub conflicts: ConflictReport,
}

/// Resolves a project's transitive dependency closure against remote
/// Maven repositories.
///
/// Version conflicts are settled **newest-wins across the whole graph**,
/// which deliberately diverges from Maven's own nearest-wins policy: for
/// every `group:artifact` the highest requested version ships, regardless
/// of its depth in the graph.
///
/// The resolver owns a shared HTTP client, the repository registry, and a
/// process-scoped resolution cache; reusing one instance across calls
/// reuses previously resolved coordinates without refetching.
pub struct DependencyResolver {
    ctx: ResolveContext,
}

impl DependencyResolver {
    /// A resolver with the default repositories (Maven Central, Google
    /// Maven, Jitpack) and a `tracing`-backed event sink.
    pub fn new() -> Result<Self, GrappleError> {
        Ok(Self {
            ctx: ResolveContext {
                client: download::build_client()?,
                registry: Arc::new(RepositoryRegistry::with_defaults()),
                cache: Arc::new(ResolverCache::new()),
                events: Arc::new(LogSink),
                max_parallel: DEFAULT_PARALLELISM,
            },
        })
    }

    pub fn with_registry(mut self, registry: RepositoryRegistry) -> Self {
        self.ctx.registry = Arc::new(registry);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.ctx.events = events;
        self
    }

    pub fn with_parallelism(mut self, max_parallel: usize) -> Self {
        self.ctx.max_parallel = max_parallel;
        self
    }

    /// Resolve the project in `project_dir` to its reconciled artifact
    /// list.
    ///
    /// A directory without any recognized manifest resolves to an empty
    /// list; only an unreadable or malformed root manifest is an error.
    pub async fn resolve(&self, project_dir: &Path) -> Result<Vec<Artifact>, GrappleError> {
        Ok(self.resolve_project(project_dir).await?.artifacts)
    }

    /// Like [`resolve`](Self::resolve), but keeps the walk graph and the
    /// conflict report alongside the artifact list.
    pub async fn resolve_project(&self, project_dir: &Path) -> Result<Resolution, GrappleError> {
        let direct = self.direct_dependencies(project_dir).await?;
        let graph = walker::walk(direct, &self.ctx).await;
        let (artifacts, conflicts) = conflict::reconcile(&graph);
        Ok(Resolution {
            graph,
            artifacts,
            conflicts,
        })
    }

    /// Discover the project manifest and extract its direct dependencies.
    async fn direct_dependencies(&self, project_dir: &Path) -> Result<Vec<Artifact>, GrappleError> {
        let pom_path = project_dir.join("pom.xml");
        if pom_path.is_file() {
            return self.maven_direct(&pom_path).await;
        }

        for name in ["build.gradle.kts", "build.gradle"] {
            let gradle_path = project_dir.join(name);
            if gradle_path.is_file() {
                let script =
                    std::fs::read_to_string(&gradle_path).map_err(|e| GrappleError::InvalidManifest {
                        message: format!("cannot read {}: {e}", gradle_path.display()),
                    })?;
                return Ok(gradle::parse_dependencies(&script));
            }
        }

        Ok(Vec::new())
    }

    async fn maven_direct(&self, pom_path: &Path) -> Result<Vec<Artifact>, GrappleError> {
        let xml = std::fs::read_to_string(pom_path).map_err(|e| GrappleError::InvalidManifest {
            message: format!("cannot read {}: {e}", pom_path.display()),
        })?;
        let parsed = pom::parse_pom(&xml).map_err(|e| GrappleError::InvalidManifest {
            message: e.to_string(),
        })?;

        // Declared repositories join the registry before any remote lookup
        // so they can serve the parent chain and BOM imports.
        for url in &parsed.repositories {
            self.ctx.registry.register(Repository::new(url.as_str(), url));
        }

        let effective = effective::expand_pom(&self.ctx.client, &self.ctx.registry, parsed, true)
            .await
            .map_err(|e| GrappleError::InvalidManifest {
                message: e.to_string(),
            })?;
        for url in &effective.repositories {
            self.ctx.registry.register(Repository::new(url.as_str(), url));
        }

        Ok(effective.direct_dependencies())
    }

    /// Download artifacts into `output_dir` as
    /// `artifactId-version[-classifier].extension`.
    ///
    /// Already-present files are skipped without any request;
    /// `pom`-packaged artifacts have nothing to download. Per-artifact
    /// failures are reported through the event sink and never abort the
    /// batch.
    pub async fn download(
        &self,
        output_dir: &Path,
        artifacts: &[Artifact],
    ) -> Result<(), GrappleError> {
        std::fs::create_dir_all(output_dir).map_err(GrappleError::Io)?;
        let events = &self.ctx.events;

        for artifact in artifacts {
            if artifact.is_pom_packaging() {
                tracing::debug!("nothing to download for pom-packaged {artifact}");
                continue;
            }
            let target = output_dir.join(artifact.file_name());
            if target.is_file() {
                events.info(&format!("{} already present, skipping", artifact.file_name()));
                continue;
            }
            let Some(url) = artifact.download_url() else {
                events.on_download_error(artifact, "no repository bound");
                continue;
            };

            let result = download::stream_to_file(
                &self.ctx.client,
                &url,
                &target,
                |total| events.on_download_start(artifact, total),
                |bytes| events.on_download_progress(artifact, bytes),
            )
            .await;

            match result {
                Ok(Some(file)) => {
                    match checksum::verify(&self.ctx.client, &url, &file.digest).await {
                        Ok(()) => events.on_download_end(artifact),
                        Err(e) => {
                            let _ = std::fs::remove_file(&target);
                            events.on_download_error(artifact, &e.to_string());
                        }
                    }
                }
                Ok(None) => events.on_download_error(artifact, "HTTP 404"),
                Err(e) => {
                    let _ = std::fs::remove_file(&target);
                    events.on_download_error(artifact, &e.to_string());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_manifest_resolves_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = DependencyResolver::new().unwrap();
        let artifacts = resolver.resolve(tmp.path()).await.unwrap();
        assert!(artifacts.is_empty());
    }

    #[tokio::test]
    async fn malformed_root_pom_is_invalid_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("pom.xml"), "<project><broken").unwrap();
        let resolver = DependencyResolver::new().unwrap();
        let err = resolver.resolve(tmp.path()).await.unwrap_err();
        assert!(matches!(err, GrappleError::InvalidManifest { .. }));
    }

    #[tokio::test]
    async fn gradle_script_without_dependencies_resolves_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("build.gradle.kts"),
            "plugins { id(\"java\") }\n",
        )
        .unwrap();
        let resolver = DependencyResolver::new().unwrap();
        let artifacts = resolver.resolve(tmp.path()).await.unwrap();
        assert!(artifacts.is_empty());
    }
}
