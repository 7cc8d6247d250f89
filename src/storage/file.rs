//! On-disk graph store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{index_entry, is_valid_graph_id, new_graph_id, newest_first, GraphStore, IndexEntry};
use crate::error::{CartographerError, Result};
use crate::graph::GraphRecord;

const GRAPHS_DIR: &str = "graphs";
const REPORTS_DIR: &str = "reports";
const INDEX_FILE: &str = "index.json";

/// JSON files under a single storage directory.
///
/// The index is re-read on every call, so several processes can share one
/// directory as long as they scan different roots.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join(GRAPHS_DIR))?;
        fs::create_dir_all(dir.join(REPORTS_DIR))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn checked_id(graph_id: &str) -> Result<&str> {
        if is_valid_graph_id(graph_id) {
            Ok(graph_id)
        } else {
            Err(CartographerError::InvalidGraphId(graph_id.to_string()))
        }
    }

    fn graph_path(&self, graph_id: &str) -> PathBuf {
        self.dir.join(GRAPHS_DIR).join(format!("{}.json", graph_id))
    }

    fn report_path(&self, graph_id: &str) -> PathBuf {
        self.dir.join(REPORTS_DIR).join(format!("{}.md", graph_id))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Index keyed by scan path. A corrupt index is treated as empty.
    fn read_index(&self) -> BTreeMap<String, IndexEntry> {
        let path = self.index_path();
        let Ok(text) = fs::read_to_string(&path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable index");
            BTreeMap::new()
        })
    }

    fn write_index(&self, index: &BTreeMap<String, IndexEntry>) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        fs::write(self.index_path(), json)?;
        Ok(())
    }

    fn write_record(&self, graph_id: &str, record: &GraphRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.graph_path(graph_id), json)?;
        Ok(())
    }

    /// Remove every artifact of an old graph. Failures are only logged.
    fn delete_artifacts(&self, graph_id: &str) {
        for path in [self.graph_path(graph_id), self.report_path(graph_id)] {
            if !path.exists() {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove old artifact");
            }
        }
    }
}

impl GraphStore for FileStore {
    fn save(&self, graph_id: Option<&str>, record: &GraphRecord) -> Result<String> {
        let id = match graph_id {
            Some(id) => Self::checked_id(id)?.to_string(),
            None => new_graph_id(),
        };

        let mut index = self.read_index();
        let entry = index_entry(&id, record);
        if let Some(entry) = &entry {
            let key = entry.path.to_string_lossy().into_owned();
            if let Some(old) = index.get(&key) {
                if old.id != id {
                    info!(path = %key, old_id = %old.id, "replacing previous scan");
                    self.delete_artifacts(&old.id);
                }
            }
        }

        self.write_record(&id, record)?;

        if let Some(entry) = entry {
            index.insert(entry.path.to_string_lossy().into_owned(), entry);
            self.write_index(&index)?;
        }
        debug!(graph_id = %id, nodes = record.nodes.len(), "graph saved");
        Ok(id)
    }

    fn load(&self, graph_id: &str) -> Result<Option<GraphRecord>> {
        if !is_valid_graph_id(graph_id) {
            return Ok(None);
        }
        let path = self.graph_path(graph_id);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn update(&self, graph_id: &str, record: &GraphRecord) -> Result<()> {
        self.write_record(Self::checked_id(graph_id)?, record)
    }

    fn save_report(&self, graph_id: &str, markdown: &str) -> Result<PathBuf> {
        let path = self.report_path(Self::checked_id(graph_id)?);
        fs::write(&path, markdown)?;
        Ok(path)
    }

    fn load_report(&self, graph_id: &str) -> Result<Option<String>> {
        if !is_valid_graph_id(graph_id) {
            return Ok(None);
        }
        let path = self.report_path(graph_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn list(&self) -> Result<Vec<IndexEntry>> {
        Ok(newest_first(self.read_index().into_values().collect()))
    }
}
