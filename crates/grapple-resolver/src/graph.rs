//! The walk graph: an arena of resolved artifacts addressed by node
//! indices, so dependency cycles need no special lifetime handling.

use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use grapple_core::artifact::Artifact;

/// Directed graph of resolved artifacts. Nodes are keyed by full identity
/// `(group, artifact, version, classifier)`; the walk's direct
/// dependencies are the roots.
pub struct ResolvedGraph {
    graph: DiGraph<Artifact, ()>,
    roots: Vec<NodeIndex>,
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            roots: Vec::new(),
        }
    }

    /// Add a walk root (a direct dependency of the project).
    pub fn add_root(&mut self, artifact: Artifact) -> NodeIndex {
        let idx = self.graph.add_node(artifact);
        self.roots.push(idx);
        idx
    }

    /// Add a new node and the edge from its parent.
    pub fn add_child(&mut self, parent: NodeIndex, artifact: Artifact) -> NodeIndex {
        let idx = self.graph.add_node(artifact);
        self.graph.add_edge(parent, idx, ());
        idx
    }

    /// Add an edge to an existing node, deduplicated.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Replace a node's artifact after resolution filled in its
    /// repository, packaging, or pinned version.
    pub fn update_node(&mut self, idx: NodeIndex, artifact: Artifact) {
        self.graph[idx] = artifact;
    }

    pub fn node(&self, idx: NodeIndex) -> &Artifact {
        &self.graph[idx]
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect()
    }

    /// Every node reachable from the roots, in BFS discovery order.
    ///
    /// This order defines the first-seen tie break used by conflict
    /// reconciliation.
    pub fn reachable(&self) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = self.roots.iter().copied().collect();

        while let Some(idx) = queue.pop_front() {
            if !visited.insert(idx) {
                continue;
            }
            order.push(idx);
            for child in self.dependencies_of(idx) {
                if !visited.contains(&child) {
                    queue.push_back(child);
                }
            }
        }

        order
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the dependency tree, one root per top-level entry. Nodes on
    /// a cycle are printed once and not re-expanded.
    pub fn print_tree(&self) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        let count = self.roots.len();
        for (i, root) in self.roots.iter().enumerate() {
            let _ = writeln!(output, "{}", self.graph[*root]);
            visited.insert(*root);
            let children = self.dependencies_of(*root);
            let child_count = children.len();
            for (j, child) in children.into_iter().enumerate() {
                self.print_subtree(
                    &mut output,
                    child,
                    "",
                    j == child_count - 1,
                    &mut visited,
                );
            }
            visited.remove(root);
            if i < count - 1 {
                output.push('\n');
            }
        }
        output
    }

    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let _ = writeln!(output, "{prefix}{connector}{}", self.graph[idx]);

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.dependencies_of(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(output, child, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }
}

impl Default for ResolvedGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(group: &str, name: &str, version: &str) -> Artifact {
        Artifact::new(group, name, version)
    }

    #[test]
    fn reachable_is_bfs_order() {
        let mut g = ResolvedGraph::new();
        let a = g.add_root(artifact("g", "a", "1"));
        let b = g.add_root(artifact("g", "b", "1"));
        let c = g.add_child(a, artifact("g", "c", "1"));
        g.add_child(c, artifact("g", "d", "1"));
        g.add_edge(b, c);

        let order: Vec<String> = g
            .reachable()
            .iter()
            .map(|&i| g.node(i).artifact_id.clone())
            .collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn reachable_terminates_on_cycles() {
        let mut g = ResolvedGraph::new();
        let a = g.add_root(artifact("g", "a", "1"));
        let b = g.add_child(a, artifact("g", "b", "1"));
        g.add_edge(b, a);

        let order = g.reachable();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn edges_deduplicated() {
        let mut g = ResolvedGraph::new();
        let a = g.add_root(artifact("g", "a", "1"));
        let b = g.add_child(a, artifact("g", "b", "1"));
        g.add_edge(a, b);
        g.add_edge(a, b);
        assert_eq!(g.dependencies_of(a).len(), 1);
    }

    #[test]
    fn tree_rendering() {
        let mut g = ResolvedGraph::new();
        let a = g.add_root(artifact("com.example", "app-core", "1.0"));
        let b = g.add_child(a, artifact("org.dep", "b", "2.0"));
        g.add_child(b, artifact("org.dep", "c", "3.0"));

        let tree = g.print_tree();
        assert!(tree.contains("com.example:app-core:1.0"));
        assert!(tree.contains("├── ") || tree.contains("└── "));
        assert!(tree.contains("org.dep:c:3.0"));
    }

    #[test]
    fn tree_rendering_survives_cycles() {
        let mut g = ResolvedGraph::new();
        let a = g.add_root(artifact("g", "a", "1"));
        let b = g.add_child(a, artifact("g", "b", "1"));
        g.add_edge(b, a);
        // Must terminate.
        let tree = g.print_tree();
        assert!(tree.contains("g:b:1"));
    }
}
