//! Process-scoped resolution memo with single-flight semantics.
//!
//! One entry per `group:artifact` key: the winning artifact and its direct
//! dependencies. While one walker task resolves a key, concurrent requests
//! for the same key await that computation and observe its result. The map
//! lock is only ever held to install or fetch a cell handle, never across
//! I/O.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use grapple_core::artifact::Artifact;

use crate::version::MavenVersion;

/// A published resolution: the winning artifact for a `group:artifact`
/// key and its direct dependencies (empty for unresolvable coordinates,
/// which are cached so they are not retried).
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub artifact: Artifact,
    pub dependencies: Vec<Artifact>,
}

impl ResolvedEntry {
    pub fn unresolvable(artifact: Artifact) -> Self {
        Self {
            artifact,
            dependencies: Vec::new(),
        }
    }
}

/// Concurrent memo keyed by `group:artifact` (classifier excluded — all
/// classifiers of a coordinate share one entry).
#[derive(Default)]
pub struct ResolverCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<ResolvedEntry>>>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &str) -> Arc<OnceCell<ResolvedEntry>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Single-flight lookup: returns the published entry for `key`, running
    /// `fetch` to produce it if nothing is published or in flight. Callers
    /// racing on the same key all observe the first computation's result.
    pub async fn get_or_resolve<F, Fut>(&self, key: &str, fetch: F) -> ResolvedEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolvedEntry>,
    {
        let cell = self.cell(key);
        cell.get_or_init(fetch).await.clone()
    }

    /// The published entry for `key`, if resolution has completed.
    pub fn peek(&self, key: &str) -> Option<ResolvedEntry> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Atomically replace the entry for `key` when the candidate's version
    /// is strictly higher than the published one (or nothing is published).
    /// Returns whether the candidate was installed.
    pub fn put_if_newer(&self, key: &str, entry: ResolvedEntry) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let newer = match entries.get(key).and_then(|cell| cell.get()) {
            Some(existing) => MavenVersion::parse(&entry.artifact.version)
                .is_higher_than(&MavenVersion::parse(&existing.artifact.version)),
            None => true,
        };
        if newer {
            entries.insert(
                key.to_string(),
                Arc::new(OnceCell::new_with(Some(entry))),
            );
        }
        newer
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
