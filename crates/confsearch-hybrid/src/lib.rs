//! confsearch-hybrid
//!
//! The service surface: [`ConferenceSearch`] wires the index lifecycle, the
//! batch indexer and the [`SearchOrchestrator`] behind four calls.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use confsearch_core::config::Settings;
use confsearch_core::data_loader::DataLoader;
use confsearch_core::traits::{EmbeddingClient, SearchBackend};
use confsearch_core::types::{Conference, SearchMode, SearchRequest, SearchResult};
use confsearch_core::{Error, Result};
use confsearch_index::{BatchIndexer, CancelToken, IndexLifecycleManager, IndexReport, WorkerPool};
use confsearch_query::{QueryBuilder, QueryVectorSource};
use indicatif::ProgressBar;
use serde_json::Value;

pub mod orchestrator;

pub use orchestrator::SearchOrchestrator;

pub struct ConferenceSearch {
    lifecycle: IndexLifecycleManager,
    indexer: BatchIndexer,
    orchestrator: SearchOrchestrator,
    index_config: Value,
    loader: DataLoader,
}

impl ConferenceSearch {
    pub fn new(
        lifecycle: IndexLifecycleManager,
        indexer: BatchIndexer,
        orchestrator: SearchOrchestrator,
        index_config: Value,
    ) -> Self {
        Self { lifecycle, indexer, orchestrator, index_config, loader: DataLoader::new() }
    }

    /// Wires every component from `settings`. The pool is owned by the
    /// caller, which also shuts it down.
    pub fn from_settings(
        settings: &Settings,
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn EmbeddingClient>,
        pool: Arc<WorkerPool>,
        index_config: Value,
    ) -> Self {
        let index = settings.elasticsearch.index.clone();
        let lifecycle = IndexLifecycleManager::new(Arc::clone(&backend), index.clone());

        let mut indexer = BatchIndexer::new(
            Arc::clone(&backend),
            Arc::clone(&embedder),
            pool,
            index.clone(),
            settings.indexing.batch_size,
        )
        .with_timeout(settings.indexing.batch_timeout_secs.map(Duration::from_secs));
        if embedder.computes_vectors() {
            indexer = indexer.with_dimensions(settings.embedding.dimensions);
        }

        let vectors = QueryVectorSource::for_client(embedder, &settings.embedding.inference_model_id);
        let orchestrator =
            SearchOrchestrator::new(backend, vectors, QueryBuilder::from_settings(&settings.search), index)
                .with_max_limit(settings.search.max_limit);

        Self::new(lifecycle, indexer, orchestrator, index_config)
    }

    /// Reports indexing progress on `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.indexer = self.indexer.with_progress(progress);
        self
    }

    pub fn index_name(&self) -> &str {
        self.lifecycle.index()
    }

    pub async fn create_index_if_needed(&self) -> Result<bool> {
        self.lifecycle.create_if_needed(&self.index_config).await
    }

    pub async fn delete_data(&self) -> Result<bool> {
        self.lifecycle.delete_data().await
    }

    pub async fn index(&self, conferences: &[Conference], cancel: &CancelToken) -> Result<IndexReport> {
        self.indexer.index(conferences, cancel).await
    }

    /// Blank `text` is an empty result whatever the mode. Otherwise `mode` is
    /// `KEYWORD`, `VECTOR` or `HYBRID`, and anything else fails before any I/O.
    pub async fn search(&self, text: &str, mode: &str, offset: usize, limit: usize) -> Result<SearchResult> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mode = SearchMode::parse(mode)?;
        self.orchestrator.search(text, mode, offset, limit).await
    }

    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResult> {
        self.orchestrator.execute(request).await
    }

    /// Ensures the index exists, then parses `path` and indexes every row.
    pub async fn load_csv(&self, path: &Path, cancel: &CancelToken) -> Result<IndexReport> {
        self.create_index_if_needed().await?;
        let conferences = self.loader.load_file(path)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.index(&conferences, cancel).await
    }
}
