//! Core types for the Cartographer dependency graph.
//!
//! Defines the in-memory node/edge weights and the persisted record shape
//! shared with the storage layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Sentinel reported as `most_central` when no module has any edge.
pub const NO_CENTRAL_MODULE: &str = "None";

/// Risk assumed for modules the AI layer did not score.
pub const BASELINE_RISK: i64 = 1;

/// Risk of `module` in `scores`, clamped to 1..=10; unscored modules get
/// [`BASELINE_RISK`].
pub fn risk_score(scores: &BTreeMap<String, i64>, module: &str) -> i64 {
    scores
        .get(module)
        .map(|score| (*score).clamp(1, 10))
        .unwrap_or(BASELINE_RISK)
}

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Derived from an import statement.
    Explicit,
    /// Inferred by AI analysis (shared table, queue topic, API route...).
    Hidden,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Explicit => write!(f, "explicit"),
            EdgeKind::Hidden => write!(f, "hidden"),
        }
    }
}

/// Data stored in a graph node: one discovered source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Dotted logical name (`pkg.sub.mod`).
    pub id: String,
    /// Absolute path of the file. Absent for records written by other tools.
    pub file_path: Option<PathBuf>,
}

impl ModuleNode {
    pub fn new(id: impl Into<String>, file_path: Option<PathBuf>) -> Self {
        Self {
            id: id.into(),
            file_path,
        }
    }
}

/// Data stored on a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub kind: EdgeKind,
}

impl EdgeData {
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind }
    }
}

// ─── Persisted Record ─────────────────────────────────────────────────────────

/// A node as stored on disk: `{"id": ..., "type": "module", "file_path": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Attributes written by other producers, preserved on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_node_type() -> String {
    "module".to_string()
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            file_path: None,
            extra: Map::new(),
        }
    }
}

/// A logical coupling reported by the AI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenLink {
    pub source: String,
    pub target: String,
    /// Free-form evidence label ("Database", "Queue", "API", ...).
    #[serde(rename = "type", default)]
    pub label: String,
}

impl HiddenLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
        }
    }
}

/// Summary of the most central module, cached with the AI attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAnalysis {
    pub module: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub used_by: Vec<String>,
    pub analysis: String,
    /// True when the text is rule-based rather than model-written.
    #[serde(default)]
    pub simulated: bool,
}

/// AI results attached to a persisted graph after the fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default)]
    pub risk_scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub hidden_links: Vec<HiddenLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_analysis: Option<ModuleAnalysis>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AiAnalysis {
    pub fn risk_of(&self, module: &str) -> i64 {
        risk_score(&self.risk_scores, module)
    }
}

/// The persisted form of one scan: `{nodes, edges, ai_analysis?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// `[source, target]` pairs. Only explicit edges are stored here.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
    /// Absolute scan path that produced this graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Markdown of the latest MRI report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Unrelated fields written by other tools, kept across updates.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphRecord {
    /// Risk scores of the attachment, or an empty map.
    pub fn risk_scores(&self) -> BTreeMap<String, i64> {
        self.ai_analysis
            .as_ref()
            .map(|a| a.risk_scores.clone())
            .unwrap_or_default()
    }

    pub fn hidden_links(&self) -> &[HiddenLink] {
        self.ai_analysis
            .as_ref()
            .map(|a| a.hidden_links.as_slice())
            .unwrap_or(&[])
    }
}

/// Output of one discovery + build pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub analyzed_files: usize,
    /// Id of the highest-degree module, or [`NO_CENTRAL_MODULE`].
    pub most_central: String,
    /// Absolute scan path.
    pub path: PathBuf,
    /// Id of the persisted record; `None` when persisting failed.
    pub graph_id: Option<String>,
    pub graph: GraphRecord,
}
