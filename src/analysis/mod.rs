//! AI analysis seam.
//!
//! The model call itself lives outside this crate. Cartographer only needs
//! something that, given a graph, eventually answers with risk scores and
//! hidden links. Empty findings are a valid answer: the map is then drawn
//! from structure alone with baseline risk everywhere.

pub mod mri;
pub mod report;

pub use mri::{run_architectural_mri, summarize_module, MriOptions, MriOutcome};
pub use report::{RiskEntry, RiskReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tracing::{debug, Level};

use crate::error::Result;
use crate::graph::{DependencyGraph, HiddenLink};

/// Characters of each file handed to an analyzer.
pub const SNIPPET_CHARS: usize = 3000;

/// Boxed future returned by [`MriAnalyzer`], keeping the trait object-safe.
pub type AnalyzerFuture<'a> = Pin<Box<dyn Future<Output = Result<MriFindings>> + Send + 'a>>;

/// What an analyzer found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MriFindings {
    #[serde(default)]
    pub risk_scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub hidden_links: Vec<HiddenLink>,
}

impl MriFindings {
    pub fn is_empty(&self) -> bool {
        self.risk_scores.is_empty() && self.hidden_links.is_empty()
    }
}

/// Scores modules and infers couplings that imports do not show.
pub trait MriAnalyzer: Send + Sync {
    fn run_mri_scan<'a>(&'a self, graph: &'a DependencyGraph) -> AnalyzerFuture<'a>;
}

/// Always answers with nothing, like a model call without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

impl MriAnalyzer for NoopAnalyzer {
    fn run_mri_scan<'a>(&'a self, _graph: &'a DependencyGraph) -> AnalyzerFuture<'a> {
        Box::pin(async { Ok(MriFindings::default()) })
    }
}

/// Replays findings produced elsewhere (a saved model response, a fixture).
#[derive(Debug, Clone, Default)]
pub struct StaticAnalyzer {
    findings: MriFindings,
}

impl StaticAnalyzer {
    pub fn new(findings: MriFindings) -> Self {
        Self { findings }
    }

    /// Read findings from a JSON file shaped `{"risk_scores": {...}, "hidden_links": [...]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let findings: MriFindings = serde_json::from_str(&text)?;
        if findings.risk_scores.values().any(|s| !(1..=10).contains(s)) {
            debug!(path = %path.display(), "findings contain scores outside 1..=10");
        }
        Ok(Self::new(findings))
    }
}

impl MriAnalyzer for StaticAnalyzer {
    fn run_mri_scan<'a>(&'a self, graph: &'a DependencyGraph) -> AnalyzerFuture<'a> {
        Box::pin(async move {
            if tracing::enabled!(Level::DEBUG) {
                let snippets = collect_snippets(graph, SNIPPET_CHARS);
                let chars: usize = snippets.values().map(|s| s.chars().count()).sum();
                debug!(
                    modules = snippets.len(),
                    chars,
                    "replaying stored findings instead of sending snippets"
                );
            }
            Ok(self.findings.clone())
        })
    }
}

/// The opening of every module's source file, keyed by module id.
///
/// This is what an analyzer sends to the model. Unreadable files are skipped.
pub fn collect_snippets(graph: &DependencyGraph, max_chars: usize) -> BTreeMap<String, String> {
    let mut snippets = BTreeMap::new();
    for module in graph.modules() {
        let Some(path) = &module.file_path else {
            continue;
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                snippets.insert(module.id.clone(), text.chars().take(max_chars).collect());
            }
            Err(e) => debug!(module = %module.id, error = %e, "could not read module source"),
        }
    }
    snippets
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_noop_analyzer_is_empty() {
        let graph = DependencyGraph::new();
        let findings = NoopAnalyzer.run_mri_scan(&graph).await.unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_static_analyzer_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("findings.json");
        fs::write(
            &path,
            r#"{"risk_scores": {"a": 7}, "hidden_links": [{"source": "a", "target": "b", "type": "Queue"}]}"#,
        )
        .unwrap();

        let analyzer = StaticAnalyzer::from_file(&path).unwrap();
        let mut graph = DependencyGraph::new();
        graph.add_module("a", None);
        let findings = analyzer.run_mri_scan(&graph).await.unwrap();
        assert_eq!(findings.risk_scores["a"], 7);
        assert_eq!(findings.hidden_links[0].label, "Queue");
    }

    #[test]
    fn test_static_analyzer_bad_file() {
        assert!(StaticAnalyzer::from_file(Path::new("/no/findings.json")).is_err());
    }

    #[test]
    fn test_collect_snippets_truncates_and_skips() {
        let dir = TempDir::new().unwrap();
        let long = dir.path().join("long.py");
        fs::write(&long, "x".repeat(SNIPPET_CHARS + 50)).unwrap();

        let mut graph = DependencyGraph::new();
        graph.add_module("long", Some(long));
        graph.add_module("gone", Some(dir.path().join("gone.py")));
        graph.add_module("virtual", None);

        let snippets = collect_snippets(&graph, SNIPPET_CHARS);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets["long"].len(), SNIPPET_CHARS);
    }
}
