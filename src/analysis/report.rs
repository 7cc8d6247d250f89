//! Markdown risk reports.

use serde::{Deserialize, Serialize};

use crate::graph::{risk_score, GraphRecord, HiddenLink, ModuleAnalysis};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub module: String,
    pub score: i64,
}

/// High-risk modules and hidden links of one graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReport {
    pub graph_id: String,
    pub threshold: i64,
    /// False when the graph was never analyzed.
    pub has_analysis: bool,
    /// Scores strictly above `threshold`, highest first, ties by module id.
    pub high_risk: Vec<RiskEntry>,
    pub hidden_links: Vec<HiddenLink>,
}

impl RiskReport {
    pub fn from_record(graph_id: &str, record: &GraphRecord, threshold: i64) -> Self {
        let scores = record.risk_scores();
        let mut high_risk: Vec<RiskEntry> = scores
            .keys()
            .map(|module| RiskEntry {
                module: module.clone(),
                score: risk_score(&scores, module),
            })
            .filter(|entry| entry.score > threshold)
            .collect();
        high_risk.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.module.cmp(&b.module)));

        Self {
            graph_id: graph_id.to_string(),
            threshold,
            has_analysis: record.ai_analysis.is_some(),
            high_risk,
            hidden_links: record.hidden_links().to_vec(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# Architectural MRI Report".to_string(),
            String::new(),
            format!("Graph: `{}`", self.graph_id),
            String::new(),
        ];

        if !self.has_analysis {
            lines.push("_No AI analysis has been run for this graph yet._".to_string());
            return join_lines(&lines);
        }

        lines.push(format!("## High-Risk Modules (score > {})", self.threshold));
        lines.push(String::new());
        if self.high_risk.is_empty() {
            lines.push("_No modules above the threshold._".to_string());
        } else {
            lines.push("| Module | Risk |".to_string());
            lines.push("|---|---|".to_string());
            lines.extend(
                self.high_risk
                    .iter()
                    .map(|entry| format!("| `{}` | {} |", entry.module, entry.score)),
            );
        }
        lines.push(String::new());

        lines.push("## Hidden Links".to_string());
        lines.push(String::new());
        if self.hidden_links.is_empty() {
            lines.push("_None detected._".to_string());
        } else {
            lines.extend(self.hidden_links.iter().map(|link| {
                let label = if link.label.is_empty() {
                    "unlabelled"
                } else {
                    link.label.as_str()
                };
                format!("- `{}` -> `{}` ({})", link.source, link.target, label)
            }));
        }
        join_lines(&lines)
    }

    /// The report followed by a section on the most central module.
    pub fn to_markdown_with(&self, module: &ModuleAnalysis) -> String {
        let mut out = self.to_markdown();
        out.push_str(&format!(
            "\n## Central Module: `{}`\n\n{}\n",
            module.module, module.analysis
        ));
        out
    }
}

/// Every line newline-terminated.
fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
