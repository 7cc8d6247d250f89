//! Read-side queries over persisted graphs.
//!
//! Every query takes a `graph_id` and answers [`Lookup::NotFound`] when no
//! such graph is stored, or [`Lookup::UnknownModule`] when a module-level
//! query names a module the graph lacks. Storage failures are the only errors.

use serde::Serialize;
use std::path::PathBuf;

use crate::analysis::RiskReport;
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::graph::{
    load_merged, render_map, HiddenLink, MapView, MergedGraph, NO_CENTRAL_MODULE,
};
use crate::storage::{GraphStore, IndexEntry};

/// Outcome of looking up a graph by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound { graph_id: String },
    UnknownModule { graph_id: String, module: String },
}

impl<T> Lookup<T> {
    pub fn not_found(graph_id: &str) -> Self {
        Lookup::NotFound {
            graph_id: graph_id.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound { .. } | Lookup::UnknownModule { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound { graph_id } => Lookup::NotFound { graph_id },
            Lookup::UnknownModule { graph_id, module } => {
                Lookup::UnknownModule { graph_id, module }
            }
        }
    }
}

fn with_graph<T>(
    store: &dyn GraphStore,
    graph_id: &str,
    f: impl FnOnce(MergedGraph) -> T,
) -> Result<Lookup<T>> {
    Ok(match load_merged(store, graph_id, false)? {
        Some(merged) => Lookup::Found(f(merged)),
        None => Lookup::not_found(graph_id),
    })
}

/// The renderable map of a stored graph, with stored hidden links and scores.
pub fn quick_map(
    store: &dyn GraphStore,
    graph_id: &str,
    config: &LayoutConfig,
) -> Result<Lookup<MapView>> {
    with_graph(store, graph_id, |merged| {
        render_map(&merged.graph, &merged.risk_scores(), config)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResponse {
    pub graph_id: String,
    pub modules: usize,
    pub explicit_connections: usize,
    pub hidden_connections: usize,
    pub most_central: String,
    pub has_analysis: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

pub fn graph_stats(store: &dyn GraphStore, graph_id: &str) -> Result<Lookup<StatsResponse>> {
    with_graph(store, graph_id, |merged| {
        let stats = merged.graph.stats();
        StatsResponse {
            has_analysis: merged.has_analysis(),
            root: merged.record.root.clone(),
            graph_id: merged.graph_id,
            modules: stats.module_count,
            explicit_connections: stats.explicit_edges,
            hidden_connections: stats.hidden_edges,
            most_central: stats
                .most_central
                .unwrap_or_else(|| NO_CENTRAL_MODULE.to_string()),
        }
    })
}

pub fn risk_report(
    store: &dyn GraphStore,
    graph_id: &str,
    threshold: i64,
) -> Result<Lookup<RiskReport>> {
    with_graph(store, graph_id, |merged| {
        RiskReport::from_record(graph_id, &merged.record, threshold)
    })
}

/// Neighbourhood of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleContext {
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub dependencies: Vec<String>,
    pub used_by: Vec<String>,
    pub risk_score: i64,
    /// Hidden links with this module at either end.
    pub hidden_links: Vec<HiddenLink>,
}

/// Context for `module` in a stored graph.
pub fn module_context(
    store: &dyn GraphStore,
    graph_id: &str,
    module: &str,
) -> Result<Lookup<ModuleContext>> {
    let Some(merged) = load_merged(store, graph_id, false)? else {
        return Ok(Lookup::not_found(graph_id));
    };
    let Some(node) = merged.graph.module(module) else {
        return Ok(Lookup::UnknownModule {
            graph_id: graph_id.to_string(),
            module: module.to_string(),
        });
    };
    let risk = merged
        .record
        .ai_analysis
        .as_ref()
        .map(|a| a.risk_of(module))
        .unwrap_or(crate::graph::BASELINE_RISK);
    let hidden_links = merged
        .record
        .hidden_links()
        .iter()
        .filter(|l| l.source == module || l.target == module)
        .cloned()
        .collect();
    Ok(Lookup::Found(ModuleContext {
        module: module.to_string(),
        file_path: node.file_path.clone(),
        dependencies: merged.graph.dependencies(module),
        used_by: merged.graph.dependents(module),
        risk_score: risk,
        hidden_links,
    }))
}

/// Every indexed scan, newest first.
pub fn list_graphs(store: &dyn GraphStore) -> Result<Vec<IndexEntry>> {
    store.list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AiAnalysis, EdgeKind, GraphRecord, NodeRecord};
    use crate::storage::MemoryStore;
    use std::collections::BTreeMap;

    fn seeded() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let record = GraphRecord {
            nodes: ["api", "db", "cache"].iter().map(|n| NodeRecord::new(*n)).collect(),
            edges: vec![("api".into(), "db".into()), ("api".into(), "cache".into())],
            ai_analysis: Some(AiAnalysis {
                risk_scores: BTreeMap::from([("api".to_string(), 8), ("db".to_string(), 3)]),
                hidden_links: vec![
                    HiddenLink::new("cache", "db", "Database"),
                    HiddenLink::new("cache", "ghost", "Queue"),
                ],
                ..AiAnalysis::default()
            }),
            ..GraphRecord::default()
        };
        let id = store.save(None, &record).unwrap();
        (store, id)
    }

    #[test]
    fn test_not_found_is_a_value() {
        let store = MemoryStore::new();
        let lookup = graph_stats(&store, "missing").unwrap();
        assert_eq!(lookup, Lookup::not_found("missing"));
        assert!(!lookup.is_found());
        let json = serde_json::to_value(quick_map(&store, "missing", &LayoutConfig::default()).unwrap()).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["graph_id"], "missing");
    }

    #[test]
    fn test_graph_stats_counts_hidden() {
        let (store, id) = seeded();
        let stats = graph_stats(&store, &id).unwrap().found().unwrap();
        assert_eq!(stats.modules, 3);
        assert_eq!(stats.explicit_connections, 2);
        assert_eq!(stats.hidden_connections, 1);
        assert_eq!(stats.most_central, "api");
        assert!(stats.has_analysis);
    }

    #[test]
    fn test_quick_map_includes_hidden_edges() {
        let (store, id) = seeded();
        let map = quick_map(&store, &id, &LayoutConfig::default())
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(map.node_count, 3);
        assert_eq!(map.edge("cache", "db").unwrap().kind, EdgeKind::Hidden);
        assert!(map.node("ghost").is_none());
    }

    #[test]
    fn test_risk_report_lookup() {
        let (store, id) = seeded();
        let report = risk_report(&store, &id, 5).unwrap().found().unwrap();
        assert_eq!(report.high_risk.len(), 1);
        assert_eq!(report.high_risk[0].module, "api");
    }

    #[test]
    fn test_module_context() {
        let (store, id) = seeded();
        let ctx = module_context(&store, &id, "db").unwrap().found().unwrap();
        assert_eq!(ctx.used_by, vec!["api", "cache"]);
        assert!(ctx.dependencies.is_empty());
        assert_eq!(ctx.risk_score, 3);
        assert_eq!(ctx.hidden_links.len(), 1);

        let cache = module_context(&store, &id, "cache").unwrap().found().unwrap();
        assert_eq!(cache.risk_score, 1);
        assert_eq!(cache.dependencies, vec!["db"]);
        assert_eq!(cache.hidden_links.len(), 2);

    }

    #[test]
    fn test_unknown_module_is_a_value() {
        let (store, id) = seeded();
        let unknown = module_context(&store, &id, "nope").unwrap();
        assert_eq!(
            unknown,
            Lookup::UnknownModule {
                graph_id: id.clone(),
                module: "nope".to_string(),
            }
        );
        let json = serde_json::to_value(&unknown).unwrap();
        assert_eq!(json["status"], "unknown_module");
        assert_eq!(json["module"], "nope");

        let missing = serde_json::to_value(module_context(&store, "missing", "db").unwrap()).unwrap();
        assert_eq!(missing["status"], "not_found");
    }

    #[test]
    fn test_lookup_map() {
        let found: Lookup<i32> = Lookup::Found(2);
        assert_eq!(found.map(|v| v * 2), Lookup::Found(4));
        let missing: Lookup<i32> = Lookup::not_found("x");
        assert_eq!(missing.map(|v| v * 2), Lookup::not_found("x"));
    }
}
