//! # Cartographer
//!
//! Dependency maps for Python repositories.
//!
//! Cartographer walks a repository, turns every source file into a module,
//! extracts its imports with tree-sitter and resolves them into a directed
//! dependency graph. Graphs are persisted and can later be enriched with AI
//! findings (risk scores, hidden couplings) and laid out for rendering.
//!
//! ## Key Features
//!
//! - **Tolerant**: unparseable files are skipped, never fatal
//! - **Tiered resolution**: exact, suffix and hierarchical matches
//! - **Overlay-aware**: hidden links are drawn but never distort the layering
//! - **Cycle-safe**: layout breaks import cycles on a throwaway copy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartographer::{scan_repository, quick_map, FileStore, ScannerConfig, LayoutConfig};
//! use std::path::Path;
//!
//! let store = FileStore::open(".cartographer").unwrap();
//! let scan = scan_repository(Path::new("."), &ScannerConfig::default(), &store);
//! println!("{} modules, most central: {}", scan.analyzed_files, scan.most_central);
//!
//! if let Some(id) = scan.graph_id {
//!     let _map = quick_map(&store, &id, &LayoutConfig::default()).unwrap();
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod query;
pub mod storage;

// Re-exports for convenience
pub use error::{CartographerError, Result};

pub use config::{CartographerConfig, LayoutConfig, ScannerConfig, StorageConfig};

// Graph re-exports
pub use graph::{
    build_graph, render_map, scan_repository, DependencyGraph, EdgeKind, GraphRecord, HiddenLink,
    MapView, ScanResult, NO_CENTRAL_MODULE,
};
pub use parser::{extract_imports, ExtractedImports, ExtractionError};
pub use query::{
    graph_stats, list_graphs, module_context, quick_map, risk_report, Lookup, ModuleContext,
    StatsResponse,
};

// Persistence and analysis
pub use analysis::{
    run_architectural_mri, MriAnalyzer, MriFindings, MriOptions, MriOutcome, NoopAnalyzer,
    StaticAnalyzer,
};
pub use storage::{FileStore, GraphStore, IndexEntry, MemoryStore};
