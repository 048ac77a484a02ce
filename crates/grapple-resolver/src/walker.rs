//! Concurrent level-synchronous BFS over the transitive dependency graph.
//!
//! Each level's resolutions run in parallel (bounded fan-out); a level
//! completes before the next begins. Per-walk state (visited identities,
//! root-to-node paths for cycle detection) scopes to one walk; resolved
//! coordinates are memoized in the shared [`ResolverCache`] across walks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use grapple_core::artifact::Artifact;
use grapple_core::events::EventSink;
use grapple_core::repository::Repository;
use grapple_maven::effective;
use grapple_maven::registry::RepositoryRegistry;
use grapple_util::errors::GrappleError;

use crate::cache::{ResolvedEntry, ResolverCache};
use crate::graph::ResolvedGraph;
use crate::version::{self, MavenVersion, VersionRange};

/// Default bound on concurrent resolve operations within one level.
pub const DEFAULT_PARALLELISM: usize = 8;

/// Everything a walk needs, threaded through instead of process globals.
#[derive(Clone)]
pub struct ResolveContext {
    pub client: Client,
    pub registry: Arc<RepositoryRegistry>,
    pub cache: Arc<ResolverCache>,
    pub events: Arc<dyn EventSink>,
    pub max_parallel: usize,
}

/// A node awaiting resolution: its graph slot, its artifact snapshot, and
/// the set of `group:artifact` keys on the path from its root (the BFS
/// rendition of a resolution stack, used for cycle detection).
struct Pending {
    node: NodeIndex,
    artifact: Artifact,
    path: Arc<HashSet<String>>,
}

/// Walk the transitive graph from a set of direct dependencies.
pub async fn walk(roots: Vec<Artifact>, ctx: &ResolveContext) -> ResolvedGraph {
    let mut graph = ResolvedGraph::new();
    let mut visited: HashMap<String, NodeIndex> = HashMap::new();
    let mut level: Vec<Pending> = Vec::new();

    for artifact in roots {
        let id = artifact.id_key();
        if visited.contains_key(&id) {
            continue;
        }
        let node = graph.add_root(artifact.clone());
        visited.insert(id, node);
        let path: HashSet<String> = HashSet::from([artifact.ga_key()]);
        level.push(Pending {
            node,
            artifact,
            path: Arc::new(path),
        });
    }

    let semaphore = Arc::new(Semaphore::new(ctx.max_parallel.max(1)));

    while !level.is_empty() {
        // Fan out this level's resolve operations; all of them join before
        // the next level is built.
        let mut join_set: JoinSet<(usize, ResolvedEntry)> = JoinSet::new();
        for (slot, pending) in level.iter().enumerate() {
            let artifact = pending.artifact.clone();
            let task_ctx = ctx.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let entry = resolve_artifact(artifact, &task_ctx).await;
                (slot, entry)
            });
        }

        let mut outcomes: Vec<Option<ResolvedEntry>> = (0..level.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            if let Ok((slot, entry)) = joined {
                outcomes[slot] = Some(entry);
            }
        }

        let mut next = Vec::new();
        for (pending, outcome) in level.iter().zip(outcomes) {
            let Some(entry) = outcome else { continue };
            graph.update_node(pending.node, entry.artifact.clone());
            let parent = entry.artifact;

            for mut child in entry.dependencies {
                if parent.excludes(&child) {
                    continue;
                }
                if pending.path.contains(&child.ga_key()) {
                    let message =
                        format!("dependency cycle detected: {parent} -> {}", child.ga_key());
                    tracing::warn!("{message}");
                    ctx.events.warning(&message);
                    continue;
                }
                child.exclusions.extend(parent.exclusions.iter().cloned());

                let id = child.id_key();
                if let Some(&existing) = visited.get(&id) {
                    graph.add_edge(pending.node, existing);
                    ctx.events.on_skipping_resolution(&child);
                    continue;
                }
                let node = graph.add_child(pending.node, child.clone());
                visited.insert(id, node);
                let mut path = (*pending.path).clone();
                path.insert(child.ga_key());
                next.push(Pending {
                    node,
                    artifact: child,
                    path: Arc::new(path),
                });
            }
        }
        level = next;
    }

    graph
}

/// Resolve one artifact's direct dependencies through the cache.
///
/// Cache policy per `group:artifact` key: an equal-version hit reuses the
/// published dependencies; a higher cached version dominates this artifact
/// (empty dependencies, reconciliation settles it); a strictly higher
/// candidate resolves fresh and overwrites the entry. Unknown keys resolve
/// single-flight.
async fn resolve_artifact(mut artifact: Artifact, ctx: &ResolveContext) -> ResolvedEntry {
    if version::is_floating(&artifact.version) || version::is_range(&artifact.version) {
        if !pin_version(&mut artifact, ctx).await {
            ctx.events.on_version_not_found(&artifact);
            let entry = ResolvedEntry::unresolvable(artifact);
            let published = entry.clone();
            ctx.cache
                .get_or_resolve(&entry.artifact.ga_key(), move || async move { published })
                .await;
            return entry;
        }
    }

    let key = artifact.ga_key();
    let ran_fetch = Arc::new(AtomicBool::new(false));
    let entry = {
        let ran_fetch = ran_fetch.clone();
        let candidate = artifact.clone();
        let task_ctx = ctx.clone();
        ctx.cache
            .get_or_resolve(&key, move || {
                ran_fetch.store(true, Ordering::SeqCst);
                async move { fetch_node(candidate, &task_ctx).await }
            })
            .await
    };
    if ran_fetch.load(Ordering::SeqCst) {
        return entry;
    }

    let ours = MavenVersion::parse(&artifact.version);
    let cached = MavenVersion::parse(&entry.artifact.version);
    if ours == cached {
        ctx.events.on_skipping_resolution(&artifact);
        let mut adopted = artifact;
        adopted.repository = entry.artifact.repository.clone();
        adopted.packaging = entry.artifact.packaging.clone();
        ResolvedEntry {
            artifact: adopted,
            dependencies: entry.dependencies,
        }
    } else if cached.is_higher_than(&ours) {
        // Dominated by the cached winner; contributes nothing and the
        // reconciliation pass settles the final pick.
        ctx.events.on_skipping_resolution(&artifact);
        ResolvedEntry::unresolvable(artifact)
    } else {
        let fresh = fetch_node(artifact, ctx).await;
        ctx.cache.put_if_newer(&key, fresh.clone());
        fresh
    }
}

/// Bind the artifact's host, fetch its effective POM, and extract direct
/// dependencies. Every failure mode degrades to an unresolvable entry;
/// nothing here aborts the walk.
async fn fetch_node(mut artifact: Artifact, ctx: &ResolveContext) -> ResolvedEntry {
    if artifact.repository.is_none() {
        match ctx.registry.discover_host(&ctx.client, &artifact).await {
            Some(repo) => artifact.repository = Some(repo),
            None => {
                let message = format!("no configured repository serves {artifact}");
                tracing::warn!("{message}");
                ctx.events.warning(&message);
                ctx.events.on_version_not_found(&artifact);
                return ResolvedEntry::unresolvable(artifact);
            }
        }
    }

    match effective::fetch_effective_pom(&ctx.client, &ctx.registry, &artifact).await {
        Ok(pom) => {
            if let Some(packaging) = pom.packaging.clone() {
                artifact.packaging = packaging;
            }
            for url in &pom.repositories {
                ctx.registry.register(Repository::new(url.as_str(), url));
            }
            let dependencies = pom.direct_dependencies();
            if dependencies.is_empty() {
                ctx.events.on_dependencies_not_found(&artifact);
            } else {
                ctx.events.on_resolution_complete(&artifact);
            }
            ResolvedEntry {
                artifact,
                dependencies,
            }
        }
        Err(GrappleError::VersionNotFound { .. }) => {
            ctx.events.on_version_not_found(&artifact);
            ResolvedEntry::unresolvable(artifact)
        }
        Err(e) => {
            ctx.events.on_invalid_pom(&artifact, &e.to_string());
            ResolvedEntry::unresolvable(artifact)
        }
    }
}

/// Pin a `LATEST`/`RELEASE`/range/empty version against repository
/// metadata. Binds the serving repository on success.
async fn pin_version(artifact: &mut Artifact, ctx: &ResolveContext) -> bool {
    let Some((meta, repo)) = ctx
        .registry
        .fetch_metadata(&ctx.client, &artifact.group_id, &artifact.artifact_id)
        .await
    else {
        return false;
    };

    let picked = if let Some(range) = VersionRange::parse(&artifact.version) {
        meta.versions
            .iter()
            .filter(|v| range.contains(&MavenVersion::parse(v)))
            .max_by_key(|v| MavenVersion::parse(v))
            .cloned()
    } else if artifact.version == "LATEST" {
        meta.latest.clone().or_else(|| meta.versions.last().cloned())
    } else {
        meta.release
            .clone()
            .or_else(|| {
                meta.versions
                    .iter()
                    .filter(|v| !MavenVersion::parse(v).is_snapshot())
                    .max_by_key(|v| MavenVersion::parse(v))
                    .cloned()
            })
            .or_else(|| meta.versions.last().cloned())
    };

    match picked {
        Some(version) => {
            tracing::debug!(
                "pinned {}:{} {:?} to {version}",
                artifact.group_id,
                artifact.artifact_id,
                artifact.version
            );
            artifact.version = version;
            artifact.repository = Some(repo);
            true
        }
        None => false,
    }
}
