//! Dependency graph module: the structural backbone of Cartographer.
//!
//! Discovery, resolution and building produce a [`DependencyGraph`]; the merge
//! layer rebuilds persisted graphs with AI overlays; the layout module turns a
//! graph into a renderable [`MapView`].

pub mod builder;
pub mod discovery;
pub mod engine;
pub mod layout;
pub mod merge;
pub mod resolver;
pub mod types;

pub use builder::{assemble, build_graph, scan_repository, ModuleImports, ScanOutput};
pub use discovery::{discover, module_id, DiscoveredModule};
pub use engine::{DependencyGraph, GraphStats};
pub use layout::{
    compute_layout, render_map, EdgeView, Layout, LayoutError, LayoutStrategy, MapView, NodeView,
    Palette,
};
pub use merge::{apply_findings, load_merged, MergedGraph};
pub use resolver::ImportResolver;
pub use types::{
    risk_score, AiAnalysis, EdgeData, EdgeKind, GraphRecord, HiddenLink, ModuleAnalysis,
    ModuleNode, NodeRecord, ScanResult, BASELINE_RISK, NO_CENTRAL_MODULE,
};
