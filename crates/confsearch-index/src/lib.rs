//! confsearch-index
//!
//! Writing side of the search system: the Elasticsearch backend, the index
//! lifecycle, and the concurrent batch indexer with its worker pool.

pub mod cancel;
pub mod elasticsearch;
pub mod indexer;
pub mod lifecycle;
pub mod memory;
pub mod pool;

use std::sync::Arc;

use confsearch_core::config::ElasticsearchSettings;
use confsearch_core::traits::SearchBackend;
use confsearch_core::Result;
use tracing::warn;

pub use cancel::CancelToken;
pub use elasticsearch::ElasticsearchBackend;
pub use indexer::{partition, BatchIndexer, IndexReport};
pub use lifecycle::IndexLifecycleManager;
pub use memory::MemoryBackend;
pub use pool::{JobHandle, WorkerPool};

/// `elasticsearch.url` value that selects the in-process backend.
pub const MEMORY_URL: &str = "memory";

/// Picks the backend for `settings.url`. [`MEMORY_URL`] gives a
/// [`MemoryBackend`] whose contents vanish with the process, which is useful
/// for checking a CSV and the embedder without a cluster.
pub fn get_default_backend(settings: &ElasticsearchSettings) -> Result<Arc<dyn SearchBackend>> {
    if settings.url == MEMORY_URL {
        warn!("Using the in-memory backend; indexed documents are discarded on exit");
        return Ok(Arc::new(MemoryBackend::new()));
    }
    Ok(Arc::new(ElasticsearchBackend::new(settings)?))
}
