//! Merge layer: rebuilds a persisted graph and overlays AI findings.

use std::collections::BTreeMap;
use tracing::debug;

use super::engine::DependencyGraph;
use super::types::{AiAnalysis, GraphRecord, HiddenLink};
use crate::error::Result;
use crate::storage::GraphStore;

/// A persisted graph, rebuilt and ready for queries.
#[derive(Debug, Clone)]
pub struct MergedGraph {
    pub graph_id: String,
    pub record: GraphRecord,
    /// Explicit edges from the record plus any applied hidden links.
    pub graph: DependencyGraph,
    pub hidden_applied: usize,
}

impl MergedGraph {
    /// Rebuild `record`. Stored hidden links are overlaid unless
    /// `force_refresh` is set, in which case they are about to be replaced.
    pub fn from_record(graph_id: impl Into<String>, record: GraphRecord, force_refresh: bool) -> Self {
        let mut graph = DependencyGraph::from_record(&record);
        let hidden_applied = if force_refresh {
            0
        } else {
            graph.merge_hidden_links(record.hidden_links())
        };
        Self {
            graph_id: graph_id.into(),
            record,
            graph,
            hidden_applied,
        }
    }

    pub fn has_analysis(&self) -> bool {
        self.record.ai_analysis.is_some()
    }

    pub fn risk_scores(&self) -> BTreeMap<String, i64> {
        self.record.risk_scores()
    }
}

/// Load and rebuild `graph_id`; `Ok(None)` when no such graph exists.
pub fn load_merged(
    store: &dyn GraphStore,
    graph_id: &str,
    force_refresh: bool,
) -> Result<Option<MergedGraph>> {
    let Some(record) = store.load(graph_id)? else {
        debug!(%graph_id, "graph not found");
        return Ok(None);
    };
    Ok(Some(MergedGraph::from_record(graph_id, record, force_refresh)))
}

/// Write fresh scores and links into the record's AI attachment.
///
/// Other attachment fields and the rest of the record are kept. A cached
/// module summary is dropped since it was derived from the old findings.
pub fn apply_findings(
    record: &mut GraphRecord,
    risk_scores: BTreeMap<String, i64>,
    hidden_links: Vec<HiddenLink>,
) {
    let analysis = record.ai_analysis.get_or_insert_with(AiAnalysis::default);
    analysis.risk_scores = risk_scores;
    analysis.hidden_links = hidden_links;
    analysis.module_analysis = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeRecord};
    use crate::storage::MemoryStore;

    fn record() -> GraphRecord {
        GraphRecord {
            nodes: vec![NodeRecord::new("a"), NodeRecord::new("b")],
            edges: vec![("a".into(), "b".into())],
            ai_analysis: Some(AiAnalysis {
                hidden_links: vec![
                    HiddenLink::new("b", "a", "Queue"),
                    HiddenLink::new("b", "ghost", "API"),
                ],
                ..AiAnalysis::default()
            }),
            ..GraphRecord::default()
        }
    }

    #[test]
    fn test_merge_overlays_known_hidden_links() {
        let merged = MergedGraph::from_record("g", record(), false);
        assert_eq!(merged.hidden_applied, 1);
        assert_eq!(merged.graph.node_count(), 2);
        assert_eq!(merged.graph.edge_kind("a", "b"), Some(EdgeKind::Explicit));
        assert_eq!(merged.graph.edge_kind("b", "a"), Some(EdgeKind::Hidden));
        assert!(!merged.graph.contains("ghost"));
    }

    #[test]
    fn test_forced_refresh_skips_stored_links() {
        let merged = MergedGraph::from_record("g", record(), true);
        assert_eq!(merged.hidden_applied, 0);
        assert_eq!(merged.graph.edge_count(), 1);
    }

    #[test]
    fn test_load_merged_not_found() {
        let store = MemoryStore::new();
        assert!(load_merged(&store, "nope", false).unwrap().is_none());
    }

    #[test]
    fn test_apply_findings_keeps_other_fields() {
        let mut rec = record();
        rec.extra.insert("owner".into(), "team-x".into());
        rec.ai_analysis
            .as_mut()
            .unwrap()
            .extra
            .insert("model".into(), "m1".into());

        apply_findings(
            &mut rec,
            BTreeMap::from([("a".to_string(), 8)]),
            vec![HiddenLink::new("a", "b", "Database")],
        );

        let analysis = rec.ai_analysis.as_ref().unwrap();
        assert_eq!(analysis.risk_scores["a"], 8);
        assert_eq!(analysis.hidden_links.len(), 1);
        assert_eq!(analysis.extra["model"], "m1");
        assert_eq!(rec.extra["owner"], "team-x");
        assert_eq!(rec.nodes.len(), 2);
    }

    #[test]
    fn test_apply_findings_creates_attachment() {
        let mut rec = GraphRecord::default();
        apply_findings(&mut rec, BTreeMap::new(), Vec::new());
        assert!(rec.ai_analysis.is_some());
    }
}
