//! Graph builder: scans a directory and builds the dependency graph.
//!
//! Discovers source files, extracts each file's imports with tree-sitter,
//! resolves them against the discovered module set and assembles the graph.
//! One bad file never aborts the scan: its extraction error is logged and the
//! module simply contributes no outgoing edges.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::discovery::{absolute_root, discover};
use super::engine::DependencyGraph;
use super::resolver::ImportResolver;
use super::types::{EdgeKind, ScanResult, NO_CENTRAL_MODULE};
use crate::config::ScannerConfig;
use crate::parser::{extract_file, ExtractionError};
use crate::storage::GraphStore;

/// One module and the raw import names found in it.
#[derive(Debug, Clone, Default)]
pub struct ModuleImports {
    pub module_id: String,
    pub file_path: Option<PathBuf>,
    pub imports: Vec<String>,
}

/// The in-memory result of a scan, before persistence.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Absolute scan root.
    pub root: PathBuf,
    pub graph: DependencyGraph,
    /// Files whose imports could not be extracted.
    pub skipped_files: usize,
    /// Modules removed by orphan pruning.
    pub pruned: usize,
}

impl ScanOutput {
    /// Modules in the final graph.
    pub fn analyzed_files(&self) -> usize {
        self.graph.node_count()
    }

    pub fn most_central(&self) -> String {
        self.graph
            .most_central()
            .unwrap_or(NO_CENTRAL_MODULE)
            .to_string()
    }
}

/// Assemble a graph from per-module imports.
///
/// Every module becomes a node first, so the resolver sees the whole module
/// set before any edge is added. Pruning, when requested, runs last.
/// Returns the graph and the number of pruned modules.
pub fn assemble(modules: Vec<ModuleImports>, prune_orphans: bool) -> (DependencyGraph, usize) {
    let mut graph = DependencyGraph::new();
    for module in &modules {
        if graph.contains(&module.module_id) {
            debug!(module = %module.module_id, "duplicate module id, keeping last path");
        }
        graph.add_module(module.module_id.clone(), module.file_path.clone());
    }

    let resolver = ImportResolver::new(graph.module_ids());
    for module in &modules {
        for raw in &module.imports {
            match resolver.resolve_from(&module.module_id, raw) {
                Some(target) => {
                    graph.add_dependency(&module.module_id, target, EdgeKind::Explicit);
                }
                None => debug!(module = %module.module_id, import = %raw, "unresolved import"),
            }
        }
    }

    let pruned = if prune_orphans {
        graph.prune_orphans()
    } else {
        0
    };
    (graph, pruned)
}

/// Build a dependency graph from all source files under `root`.
pub fn build_graph(root: &Path, config: &ScannerConfig) -> ScanOutput {
    let root = absolute_root(root);
    let discovered = discover(&root, config);

    let mut skipped_files = 0;
    let modules: Vec<ModuleImports> = discovered
        .into_iter()
        .map(|found| {
            let imports = match extract_file(&found.file_path) {
                Ok(extracted) => extracted.names().map(String::from).collect(),
                Err(ExtractionError::Empty) => Vec::new(),
                Err(e) => {
                    warn!(file = %found.file_path.display(), error = %e, "skipping imports");
                    skipped_files += 1;
                    Vec::new()
                }
            };
            ModuleImports {
                module_id: found.module_id,
                file_path: Some(found.file_path),
                imports,
            }
        })
        .collect();

    let (graph, pruned) = assemble(modules, config.prune_orphans);
    info!(
        root = %root.display(),
        modules = graph.node_count(),
        edges = graph.edge_count(),
        skipped = skipped_files,
        pruned,
        "scan complete"
    );

    ScanOutput {
        root,
        graph,
        skipped_files,
        pruned,
    }
}

/// Scan `root`, persist the graph and report the outcome.
///
/// A persistence failure is logged and reported as `graph_id: None`; the scan
/// itself still succeeds.
pub fn scan_repository(root: &Path, config: &ScannerConfig, store: &dyn GraphStore) -> ScanResult {
    let output = build_graph(root, config);

    let mut record = output.graph.to_record();
    record.root = Some(output.root.clone());

    let graph_id = match store.save(None, &record) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "failed to persist graph");
            None
        }
    };

    ScanResult {
        analyzed_files: output.analyzed_files(),
        most_central: output.most_central(),
        path: output.root,
        graph_id,
        graph: record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn module(id: &str, imports: &[&str]) -> ModuleImports {
        ModuleImports {
            module_id: id.to_string(),
            file_path: None,
            imports: imports.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_assemble_resolves_and_collapses() {
        let (graph, pruned) = assemble(
            vec![
                module("pkg.api", &["pkg.db", "db", "pkg.db.session", "os", "pkg.api"]),
                module("pkg.db", &[]),
            ],
            false,
        );
        assert_eq!(pruned, 0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_kind("pkg.api", "pkg.db"), Some(EdgeKind::Explicit));
    }

    #[test]
    fn test_assemble_forward_references() {
        // `a` imports `b` before `b` has been seen in iteration order.
        let (graph, _) = assemble(vec![module("a", &["b"]), module("b", &[])], false);
        assert_eq!(graph.dependencies("a"), vec!["b"]);
    }

    #[test]
    fn test_assemble_prunes_after_all_edges() {
        let (graph, pruned) = assemble(
            vec![
                module("lonely", &["requests"]),
                module("a", &[]),
                module("b", &["a"]),
            ],
            true,
        );
        assert_eq!(pruned, 1);
        assert_eq!(graph.module_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_build_graph_tolerates_bad_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.py", "import helper\n");
        write(dir.path(), "helper.py", "");
        write(dir.path(), "broken.py", "import helper\ndef oops(:\n");

        let output = build_graph(dir.path(), &ScannerConfig::default());
        assert_eq!(output.analyzed_files(), 3);
        assert_eq!(output.skipped_files, 1);
        assert_eq!(output.graph.dependencies("good"), vec!["helper"]);
        assert!(output.graph.dependencies("broken").is_empty());
    }

    #[test]
    fn test_scan_repository_persists_record() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/main.py", "from app.models import User\n");
        write(dir.path(), "app/models.py", "import json\n");

        let store = MemoryStore::new();
        let result = scan_repository(dir.path(), &ScannerConfig::default(), &store);

        assert_eq!(result.analyzed_files, 2);
        assert_eq!(result.most_central, "app.main");
        assert!(result.path.is_absolute());
        let graph_id = result.graph_id.expect("graph persisted");
        let stored = store.load(&graph_id).unwrap().unwrap();
        assert_eq!(
            stored.edges,
            vec![("app.main".to_string(), "app.models".to_string())]
        );
        assert_eq!(stored.root.as_deref(), Some(result.path.as_path()));
    }

    #[test]
    fn test_scan_missing_root() {
        let store = MemoryStore::new();
        let result = scan_repository(
            Path::new("/no/such/dir/anywhere"),
            &ScannerConfig::default(),
            &store,
        );
        assert_eq!(result.analyzed_files, 0);
        assert_eq!(result.most_central, NO_CENTRAL_MODULE);
    }
}
