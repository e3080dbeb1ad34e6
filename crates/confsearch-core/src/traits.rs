use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Conference, SearchHit};

/// Turns text into vectors. Implementations are interchangeable at
/// configuration time and never depend on one another.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Provider name for logs, e.g. `tei` or `vertex`.
    fn name(&self) -> &str;

    /// Whether this client produces vectors itself. `false` means the search
    /// backend computes them server-side and documents are written as-is.
    fn computes_vectors(&self) -> bool {
        true
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns new, embedded copies of `conferences` in input order. Any
    /// failure fails the whole call; no partially embedded list is returned.
    async fn embed_batch(&self, conferences: &[Conference]) -> Result<Vec<Conference>>;
}

/// One bulk operation: upsert `document` under `id`.
#[derive(Debug, Clone)]
pub struct Upsert {
    pub id: String,
    pub document: Value,
}

/// Per-item outcome summary of a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub total: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }
}

/// The subset of a search engine's REST surface this system relies on.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn exists(&self, index: &str) -> Result<bool>;
    /// Returns the backend's `acknowledged` flag.
    async fn create(&self, index: &str, config: &Value) -> Result<bool>;
    /// Returns the backend's `acknowledged` flag.
    async fn delete(&self, index: &str) -> Result<bool>;
    async fn bulk(&self, index: &str, operations: &[Upsert]) -> Result<BulkOutcome>;
    /// Hits in backend ranking order.
    async fn search(&self, index: &str, body: &Value) -> Result<Vec<SearchHit>>;
}
