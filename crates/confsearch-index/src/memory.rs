//! In-process `SearchBackend` for tests and dry runs (`elasticsearch.url = "memory"`).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use confsearch_core::traits::{BulkOutcome, SearchBackend, Upsert};
use confsearch_core::types::{Conference, SearchHit};
use confsearch_core::{Error, Result};
use serde_json::Value;

#[derive(Debug, Default)]
struct State {
    indices: HashMap<String, BTreeMap<String, Value>>,
    searches: Vec<Value>,
}

/// Stores documents per index in memory. Search does no ranking: it returns
/// the scripted hits if any were set, otherwise every stored document.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    acknowledge: bool,
    rejected_ids: HashSet<String>,
    scripted_hits: Option<Vec<SearchHit>>,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    bulks: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            acknowledge: true,
            rejected_ids: HashSet::new(),
            scripted_hits: None,
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            bulks: AtomicUsize::new(0),
        }
    }

    /// Create and delete report `acknowledged: false`.
    #[must_use]
    pub fn unacknowledged(mut self) -> Self {
        self.acknowledge = false;
        self
    }

    /// Bulk items with these ids come back as item errors.
    #[must_use]
    pub fn rejecting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.scripted_hits = Some(hits);
        self
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::backend("memory", "*", "state lock poisoned"))
    }

    pub fn with_index(self, index: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.indices.entry(index.to_string()).or_default();
        }
        self
    }

    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.state
            .lock()
            .map(|s| s.indices.get(index).map(|docs| docs.values().cloned().collect()).unwrap_or_default())
            .unwrap_or_default()
    }

    /// Request bodies received by `search`, oldest first.
    pub fn searches(&self) -> Vec<Value> {
        self.state.lock().map(|s| s.searches.clone()).unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn exists(&self, index: &str) -> Result<bool> {
        Ok(self.state()?.indices.contains_key(index))
    }

    async fn create(&self, index: &str, _config: &Value) -> Result<bool> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;
        if state.indices.contains_key(index) {
            return Err(Error::backend("create", index, "resource_already_exists_exception"));
        }
        if self.acknowledge {
            state.indices.insert(index.to_string(), BTreeMap::new());
        }
        Ok(self.acknowledge)
    }

    async fn delete(&self, index: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;
        if !state.indices.contains_key(index) {
            return Err(Error::backend("delete", index, "index_not_found_exception"));
        }
        if self.acknowledge {
            state.indices.remove(index);
        }
        Ok(self.acknowledge)
    }

    async fn bulk(&self, index: &str, operations: &[Upsert]) -> Result<BulkOutcome> {
        self.bulks.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;
        let docs = state.indices.entry(index.to_string()).or_default();
        let mut failed = 0;
        for op in operations {
            if self.rejected_ids.contains(&op.id) {
                failed += 1;
            } else {
                docs.insert(op.id.clone(), op.document.clone());
            }
        }
        Ok(BulkOutcome { total: operations.len(), failed })
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Vec<SearchHit>> {
        let mut state = self.state()?;
        state.searches.push(body.clone());
        if let Some(hits) = &self.scripted_hits {
            return Ok(hits.clone());
        }
        let docs = state
            .indices
            .get(index)
            .ok_or_else(|| Error::backend("search", index, "index_not_found_exception"))?;
        docs.values()
            .map(|doc| {
                serde_json::from_value::<Conference>(doc.clone())
                    .map(|conference| SearchHit { conference, score: None })
                    .map_err(|e| Error::backend("search", index, e))
            })
            .collect()
    }
}
