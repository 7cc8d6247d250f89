//! Persistence for graph records and their reports.
//!
//! The core only talks to [`GraphStore`]. [`FileStore`] keeps everything
//! under one directory on disk; [`MemoryStore`] is for tests and embedders.
//!
//! ```text
//! <dir>/
//!   ├── graphs/<graph_id>.json
//!   ├── reports/<graph_id>.md
//!   └── index.json        scan path -> latest IndexEntry
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::graph::GraphRecord;

/// Latest scan of one project path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub nodes: usize,
    pub path: PathBuf,
}

/// Storage collaborator for persisted graphs.
pub trait GraphStore: Send + Sync {
    /// Persist `record`. With `graph_id: None` a fresh id is generated and any
    /// earlier graph of the same scan root is replaced. Returns the id.
    fn save(&self, graph_id: Option<&str>, record: &GraphRecord) -> Result<String>;

    /// Load a record; `Ok(None)` when no graph has this id.
    fn load(&self, graph_id: &str) -> Result<Option<GraphRecord>>;

    /// Overwrite the record stored under an existing id.
    fn update(&self, graph_id: &str, record: &GraphRecord) -> Result<()>;

    /// Store a markdown report for a graph. Returns where it was written.
    fn save_report(&self, graph_id: &str, markdown: &str) -> Result<PathBuf>;

    fn load_report(&self, graph_id: &str) -> Result<Option<String>>;

    /// Index entries, newest first.
    fn list(&self) -> Result<Vec<IndexEntry>>;
}

/// A fresh graph id: 32 lowercase hex characters.
pub fn new_graph_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Graph ids double as file names: only ASCII letters, digits, `_` and `-`.
pub fn is_valid_graph_id(graph_id: &str) -> bool {
    !graph_id.is_empty()
        && graph_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn index_entry(id: &str, record: &GraphRecord) -> Option<IndexEntry> {
    record.root.as_ref().map(|root| IndexEntry {
        id: id.to_string(),
        timestamp: Utc::now(),
        nodes: record.nodes.len(),
        path: root.clone(),
    })
}

fn newest_first(mut entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.path.cmp(&b.path)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_graph_id_shape() {
        let id = new_graph_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_graph_id());
        assert!(is_valid_graph_id(&id));
    }

    #[test]
    fn test_graph_id_must_be_a_bare_name() {
        assert!(is_valid_graph_id("lonely-graph_2"));
        for bad in ["", "../../x", "a/b", "a.b", "..", "a\\b"] {
            assert!(!is_valid_graph_id(bad), "{bad}");
        }
    }
}
