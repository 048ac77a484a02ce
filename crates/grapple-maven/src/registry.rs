//! Repository registry: the ordered list of remote endpoints and the
//! host-discovery probe that binds a coordinate to its origin.

use std::sync::Mutex;

use reqwest::Client;

use grapple_core::artifact::Artifact;
use grapple_core::repository::Repository;

use crate::download;
use crate::metadata::{self, MavenMetadata};

/// Ordered collection of remote repositories.
///
/// Read-mostly; repositories discovered from POM `<repositories>` sections
/// append under the mutex. Probe order is registration order.
pub struct RepositoryRegistry {
    repos: Mutex<Vec<Repository>>,
}

impl RepositoryRegistry {
    pub fn new(repos: Vec<Repository>) -> Self {
        Self {
            repos: Mutex::new(repos),
        }
    }

    /// The default registry: Maven Central, Google Maven, Jitpack, in that
    /// probe order.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Repository::maven_central(),
            Repository::google(),
            Repository::jitpack(),
        ])
    }

    /// Snapshot of the current repository list.
    pub fn repositories(&self) -> Vec<Repository> {
        self.repos.lock().expect("registry lock poisoned").clone()
    }

    /// Append a repository unless its base URL is already registered.
    pub fn register(&self, repo: Repository) {
        let mut repos = self.repos.lock().expect("registry lock poisoned");
        if !repos.iter().any(|r| r.base_url == repo.base_url) {
            tracing::debug!("registering repository {} ({})", repo.name, repo.base_url);
            repos.push(repo);
        }
    }

    /// Probe each repository in order with a HEAD request against the
    /// artifact's POM URL; the first 2xx response wins.
    ///
    /// Probing is sequential per artifact; callers run artifacts in
    /// parallel.
    pub async fn discover_host(&self, client: &Client, artifact: &Artifact) -> Option<Repository> {
        for repo in self.repositories() {
            let url = repo.pom_url(&artifact.group_id, &artifact.artifact_id, &artifact.version);
            match client.head(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("{artifact} found in {}", repo.name);
                    return Some(repo);
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("probe of {} failed: {e}", repo.name);
                    continue;
                }
            }
        }
        None
    }

    /// Fetch `maven-metadata.xml` for a coordinate from the first
    /// repository that serves it.
    pub async fn fetch_metadata(
        &self,
        client: &Client,
        group_id: &str,
        artifact_id: &str,
    ) -> Option<(MavenMetadata, Repository)> {
        for repo in self.repositories() {
            let url = repo.metadata_url(group_id, artifact_id);
            match download::fetch_text(client, &url).await {
                Ok(Some(xml)) => match metadata::parse_metadata(&xml) {
                    Ok(meta) => return Some((meta, repo)),
                    Err(e) => {
                        tracing::warn!("unusable metadata from {}: {e}", repo.name);
                        continue;
                    }
                },
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("metadata fetch from {} failed: {e}", repo.name);
                    continue;
                }
            }
        }
        None
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
