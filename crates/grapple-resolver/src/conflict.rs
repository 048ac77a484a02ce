//! Post-walk conflict reconciliation: collapse the graph to one artifact
//! per `group:artifact` key, newest version winning.

use std::collections::HashMap;
use std::fmt;

use grapple_core::artifact::Artifact;

use crate::graph::ResolvedGraph;
use crate::version::MavenVersion;

/// A version that lost reconciliation: `requested` was seen in the graph
/// but `selected` shipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub group: String,
    pub artifact: String,
    pub requested: String,
    pub selected: String,
}

/// All version conflicts observed during one reconciliation pass.
/// Informational only; the resolution result is unaffected.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(
                f,
                "  {}:{} requested {} but selected {} (newest wins)",
                c.group, c.artifact, c.requested, c.selected
            )?;
        }
        Ok(())
    }
}

/// Collapse every reachable artifact to one winner per `group:artifact`.
///
/// The winner carries the maximal version under the Maven total order;
/// ties keep the first node in BFS discovery order. Unresolvable
/// placeholders (no bound repository or no concrete version) are dropped
/// from the returned list.
pub fn reconcile(graph: &ResolvedGraph) -> (Vec<Artifact>, ConflictReport) {
    let mut key_order: Vec<String> = Vec::new();
    let mut winners: HashMap<String, Artifact> = HashMap::new();
    let mut sightings: Vec<(String, String)> = Vec::new();

    for idx in graph.reachable() {
        let artifact = graph.node(idx);
        let key = artifact.ga_key();
        let sighting = (key.clone(), artifact.version.clone());
        if !sightings.contains(&sighting) {
            sightings.push(sighting);
        }
        match winners.get(&key) {
            None => {
                key_order.push(key.clone());
                winners.insert(key, artifact.clone());
            }
            Some(current) => {
                let challenger = MavenVersion::parse(&artifact.version);
                if challenger.is_higher_than(&MavenVersion::parse(&current.version)) {
                    winners.insert(key, artifact.clone());
                }
            }
        }
    }

    let mut report = ConflictReport::new();
    for (key, version) in sightings {
        let winner = &winners[&key];
        if version != winner.version {
            report.add(VersionConflict {
                group: winner.group_id.clone(),
                artifact: winner.artifact_id.clone(),
                requested: version,
                selected: winner.version.clone(),
            });
        }
    }

    let artifacts = key_order
        .into_iter()
        .filter_map(|key| winners.remove(&key))
        .filter(|a| a.repository.is_some() && a.has_version())
        .collect();

    (artifacts, report)
}
