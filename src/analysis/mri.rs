//! The architectural MRI: AI findings, merged map and report for one graph.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use super::report::RiskReport;
use super::MriAnalyzer;
use crate::config::{CartographerConfig, LayoutConfig};
use crate::error::Result;
use crate::graph::{
    apply_findings, render_map, DependencyGraph, MapView, MergedGraph, ModuleAnalysis,
};
use crate::query::Lookup;
use crate::storage::GraphStore;

/// Modules with more direct dependencies than this are orchestrators.
const ORCHESTRATOR_MIN_DEPS: usize = 2;

#[derive(Debug, Clone)]
pub struct MriOptions {
    /// Ignore any stored findings and ask the analyzer again.
    pub force_refresh: bool,
    pub layout: LayoutConfig,
    pub high_risk_threshold: i64,
}

impl Default for MriOptions {
    fn default() -> Self {
        Self::from_config(&CartographerConfig::default(), false)
    }
}

impl MriOptions {
    pub fn from_config(config: &CartographerConfig, force_refresh: bool) -> Self {
        Self {
            force_refresh,
            layout: config.layout.clone(),
            high_risk_threshold: config.storage.high_risk_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MriOutcome {
    pub graph_id: String,
    /// The module the summary describes.
    pub module: String,
    pub analysis: ModuleAnalysis,
    /// True when the stored summary was returned without recomputation.
    pub cached: bool,
    pub analyzer_invoked: bool,
    pub risk_scores: BTreeMap<String, i64>,
    pub hidden_links_applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

/// Rule-based summary of `module`'s place in the graph.
pub fn summarize_module(graph: &DependencyGraph, module: &str) -> ModuleAnalysis {
    let dependencies = graph.dependencies(module);
    let used_by = graph.dependents(module);
    let heavy = dependencies.len() > ORCHESTRATOR_MIN_DEPS;
    let (role, complexity, recommendation) = if heavy {
        ("Core Orchestrator", "High", "Consider decoupling logic.")
    } else {
        ("Utility Helper", "Low", "Keep as is.")
    };

    let analysis = format!(
        "Module: {}\nRole: {}\nComplexity Risk: {}\nDependencies: {}\nUsed by: {}\n\nRecommendation: {}",
        module,
        role,
        complexity,
        dependencies.len(),
        used_by.len(),
        recommendation
    );

    ModuleAnalysis {
        module: module.to_string(),
        dependencies,
        used_by,
        analysis,
        simulated: true,
    }
}

/// Run (or replay) the AI analysis of a stored graph.
///
/// A stored attachment is reused unless `force_refresh` is set; a stored
/// module summary short-circuits everything. Otherwise the analyzer is asked,
/// its findings are written back, and the merged map, report and module
/// summary are produced and stored. An analyzer error leaves the stored
/// attachment as it was, so the next run asks again; the current run renders
/// whatever findings were already stored.
pub async fn run_architectural_mri(
    store: &dyn GraphStore,
    analyzer: &dyn MriAnalyzer,
    graph_id: &str,
    options: &MriOptions,
) -> Result<Lookup<MriOutcome>> {
    let Some(mut record) = store.load(graph_id)? else {
        return Ok(Lookup::not_found(graph_id));
    };

    let cache_hit = !options.force_refresh && record.ai_analysis.is_some();
    if cache_hit {
        let cached = record
            .ai_analysis
            .as_ref()
            .and_then(|a| a.module_analysis.clone());
        if let Some(analysis) = cached {
            info!(%graph_id, module = %analysis.module, "returning cached module analysis");
            return Ok(Lookup::Found(MriOutcome {
                graph_id: graph_id.to_string(),
                module: analysis.module.clone(),
                analysis,
                cached: true,
                analyzer_invoked: false,
                risk_scores: record.risk_scores(),
                hidden_links_applied: 0,
                map: None,
                report_path: None,
            }));
        }
    } else {
        let structural = MergedGraph::from_record(graph_id, record.clone(), true).graph;
        match analyzer.run_mri_scan(&structural).await {
            Ok(findings) => {
                info!(
                    %graph_id,
                    scores = findings.risk_scores.len(),
                    hidden_links = findings.hidden_links.len(),
                    "MRI findings received"
                );
                apply_findings(&mut record, findings.risk_scores, findings.hidden_links);
                store.update(graph_id, &record)?;
            }
            Err(e) => {
                warn!(%graph_id, error = %e, "AI analysis failed, continuing without findings");
            }
        }
    }

    let merged = MergedGraph::from_record(graph_id, record, false);
    let module = merged
        .graph
        .most_central()
        .map(String::from)
        .unwrap_or_else(|| graph_id.to_string());
    let analysis = summarize_module(&merged.graph, &module);
    let risk_scores = merged.risk_scores();
    let map = render_map(&merged.graph, &risk_scores, &options.layout);

    let report = RiskReport::from_record(graph_id, &merged.record, options.high_risk_threshold)
        .to_markdown_with(&analysis);
    let report_path = store.save_report(graph_id, &report)?;

    let mut record = merged.record;
    if let Some(ai) = record.ai_analysis.as_mut() {
        ai.module_analysis = Some(analysis.clone());
    }
    record.report = Some(report);
    store.update(graph_id, &record)?;

    Ok(Lookup::Found(MriOutcome {
        graph_id: graph_id.to_string(),
        module,
        analysis,
        cached: false,
        analyzer_invoked: !cache_hit,
        risk_scores,
        hidden_links_applied: merged.hidden_applied,
        map: Some(map),
        report_path: Some(report_path),
    }))
}
