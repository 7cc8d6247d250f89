//! The core graph engine for Cartographer.
//!
//! Uses petgraph to store module dependencies and provides the degree
//! metrics, pruning and (de)serialization the rest of the crate builds on.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use super::types::*;

/// The module dependency graph of one scan.
///
/// Edges point from the dependant to its dependency. The graph is simple:
/// at most one edge per ordered pair, and never a self-edge. Node iteration
/// order is insertion order, which keeps every tie-break reproducible.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<ModuleNode, EdgeData>,
    /// Index: module id -> node index.
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add a module node. Adding an existing id refreshes its file path.
    pub fn add_module(&mut self, id: impl Into<String>, file_path: Option<PathBuf>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.index.get(&id) {
            if file_path.is_some() {
                self.graph[idx].file_path = file_path;
            }
            return idx;
        }
        let idx = self.graph.add_node(ModuleNode::new(id.clone(), file_path));
        self.index.insert(id, idx);
        idx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn module(&self, id: &str) -> Option<&ModuleNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// All modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn module_ids(&self) -> Vec<String> {
        self.modules().map(|m| m.id.clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add `source -> target`. Returns `false` (and adds nothing) when either
    /// endpoint is unknown or `source == target`. Re-adding an existing edge
    /// overwrites its kind instead of creating a parallel edge.
    pub fn add_dependency(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        if source == target {
            return false;
        }
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge] = EdgeData::new(kind),
            None => {
                self.graph.add_edge(from, to, EdgeData::new(kind));
            }
        }
        true
    }

    /// Remove `source -> target`. Returns whether an edge was removed.
    pub fn remove_dependency(&mut self, source: &str, target: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    pub fn edge_kind(&self, source: &str, target: &str) -> Option<EdgeKind> {
        let from = *self.index.get(source)?;
        let to = *self.index.get(target)?;
        self.graph.find_edge(from, to).map(|e| self.graph[e].kind)
    }

    /// All edges as `(source, target, kind)`, in edge insertion order.
    pub fn edges(&self) -> Vec<(&str, &str, EdgeKind)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.as_str(),
                    self.graph[e.target()].id.as_str(),
                    e.weight().kind,
                )
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge_count_of(&self, kind: EdgeKind) -> usize {
        self.graph
            .edge_references()
            .filter(|e| e.weight().kind == kind)
            .count()
    }

    // ─── Query Operations ───────────────────────────────────────

    /// Modules `id` depends on, sorted.
    pub fn dependencies(&self, id: &str) -> Vec<String> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Modules that depend on `id`, sorted.
    pub fn dependents(&self, id: &str) -> Vec<String> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.degree_in(id, Direction::Incoming)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.degree_in(id, Direction::Outgoing)
    }

    /// Total degree (in + out).
    pub fn degree(&self, id: &str) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    fn degree_in(&self, id: &str, direction: Direction) -> usize {
        self.index
            .get(id)
            .map(|&idx| self.graph.edges_directed(idx, direction).count())
            .unwrap_or(0)
    }

    /// The module with the highest total degree. Ties go to the module added
    /// first; a graph with no edges has no central module.
    pub fn most_central(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for node in self.modules() {
            let degree = self.degree(&node.id);
            if degree == 0 {
                continue;
            }
            if best.map_or(true, |(_, d)| degree > d) {
                best = Some((node.id.as_str(), degree));
            }
        }
        best.map(|(id, _)| id)
    }

    /// In-degree divided by `n - 1`. A lone module scores 1.0.
    pub fn in_degree_centrality(&self) -> HashMap<String, f64> {
        let n = self.node_count();
        if n <= 1 {
            return self.modules().map(|m| (m.id.clone(), 1.0)).collect();
        }
        let scale = 1.0 / (n - 1) as f64;
        self.modules()
            .map(|m| (m.id.clone(), self.in_degree(&m.id) as f64 * scale))
            .collect()
    }

    // ─── Whole-Graph Operations ─────────────────────────────────

    /// Remove every module with neither incoming nor outgoing edges.
    /// Must run after all edges are in place. Returns the number removed.
    pub fn prune_orphans(&mut self) -> usize {
        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph.neighbors_undirected(idx).next().is_none())
            .collect();

        for &idx in &orphans {
            if let Some(node) = self.graph.remove_node(idx) {
                debug!(module = %node.id, "pruning orphan module");
                self.index.remove(&node.id);
            }
        }
        orphans.len()
    }

    /// Add hidden links whose endpoints both exist. Links naming unknown
    /// modules or pointing a module at itself are skipped. Returns the number
    /// of links applied.
    pub fn merge_hidden_links(&mut self, links: &[HiddenLink]) -> usize {
        let mut applied = 0;
        for link in links {
            if self.add_dependency(&link.source, &link.target, EdgeKind::Hidden) {
                applied += 1;
            } else {
                debug!(
                    source = %link.source,
                    target = %link.target,
                    "skipping hidden link with unknown or identical endpoints"
                );
            }
        }
        applied
    }

    /// Copy of this graph restricted to one edge kind. Every node is kept.
    pub fn filter_edges(&self, kind: EdgeKind) -> DependencyGraph {
        let mut filtered = DependencyGraph::new();
        for node in self.modules() {
            filtered.add_module(node.id.clone(), node.file_path.clone());
        }
        for (source, target, edge_kind) in self.edges() {
            if edge_kind == kind {
                filtered.add_dependency(source, target, edge_kind);
            }
        }
        filtered
    }

    /// Whether any directed cycle exists, over every edge kind.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            module_count: self.node_count(),
            explicit_edges: self.edge_count_of(EdgeKind::Explicit),
            hidden_edges: self.edge_count_of(EdgeKind::Hidden),
            most_central: self.most_central().map(String::from),
        }
    }

    // ─── Persistence ────────────────────────────────────────────

    /// Persistable form. Only explicit edges are written as structural edges.
    pub fn to_record(&self) -> GraphRecord {
        let nodes = self
            .modules()
            .map(|m| NodeRecord {
                file_path: m.file_path.clone(),
                ..NodeRecord::new(m.id.clone())
            })
            .collect();
        let edges = self
            .edges()
            .into_iter()
            .filter(|(_, _, kind)| *kind == EdgeKind::Explicit)
            .map(|(s, t, _)| (s.to_string(), t.to_string()))
            .collect();
        GraphRecord {
            nodes,
            edges,
            ..GraphRecord::default()
        }
    }

    /// Rebuild from a persisted record. Every stored edge is explicit; edges
    /// naming unknown nodes are dropped rather than inventing nodes.
    pub fn from_record(record: &GraphRecord) -> Self {
        let mut graph = DependencyGraph::new();
        for node in &record.nodes {
            graph.add_module(node.id.clone(), node.file_path.clone());
        }
        let mut dropped = 0usize;
        for (source, target) in &record.edges {
            if !graph.add_dependency(source, target, EdgeKind::Explicit) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            info!(dropped, "ignored stored edges with unknown endpoints");
        }
        graph
    }
}

/// Graph statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub module_count: usize,
    pub explicit_edges: usize,
    pub hidden_edges: usize,
    pub most_central: Option<String>,
}
