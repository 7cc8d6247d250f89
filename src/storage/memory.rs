//! In-process graph store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{index_entry, new_graph_id, newest_first, GraphStore, IndexEntry};
use crate::error::Result;
use crate::graph::GraphRecord;

#[derive(Debug, Default)]
struct Inner {
    graphs: HashMap<String, GraphRecord>,
    reports: HashMap<String, String>,
    index: HashMap<PathBuf, IndexEntry>,
}

/// Keeps every record in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-write;
        // the maps themselves are still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl GraphStore for MemoryStore {
    fn save(&self, graph_id: Option<&str>, record: &GraphRecord) -> Result<String> {
        let id = graph_id.map(String::from).unwrap_or_else(new_graph_id);
        let mut inner = self.lock();
        if let Some(entry) = index_entry(&id, record) {
            if let Some(old) = inner.index.insert(entry.path.clone(), entry) {
                if old.id != id {
                    inner.graphs.remove(&old.id);
                    inner.reports.remove(&old.id);
                }
            }
        }
        inner.graphs.insert(id.clone(), record.clone());
        Ok(id)
    }

    fn load(&self, graph_id: &str) -> Result<Option<GraphRecord>> {
        Ok(self.lock().graphs.get(graph_id).cloned())
    }

    fn update(&self, graph_id: &str, record: &GraphRecord) -> Result<()> {
        self.lock()
            .graphs
            .insert(graph_id.to_string(), record.clone());
        Ok(())
    }

    fn save_report(&self, graph_id: &str, markdown: &str) -> Result<PathBuf> {
        self.lock()
            .reports
            .insert(graph_id.to_string(), markdown.to_string());
        Ok(PathBuf::from(format!("reports/{}.md", graph_id)))
    }

    fn load_report(&self, graph_id: &str) -> Result<Option<String>> {
        Ok(self.lock().reports.get(graph_id).cloned())
    }

    fn list(&self) -> Result<Vec<IndexEntry>> {
        Ok(newest_first(self.lock().index.values().cloned().collect()))
    }
}
