use std::sync::Arc;
use std::time::Instant;

use confsearch_core::traits::SearchBackend;
use confsearch_core::types::{SearchMode, SearchRequest, SearchResult, MAX_LIMIT};
use confsearch_core::Result;
use confsearch_query::{QueryBuilder, QueryVectorSource};
use tracing::info;

/// Runs one query end to end: vector (if the mode needs one), request body,
/// backend call, hits to scored conferences in backend order.
pub struct SearchOrchestrator {
    backend: Arc<dyn SearchBackend>,
    vectors: QueryVectorSource,
    builder: QueryBuilder,
    index: String,
    max_limit: usize,
}

impl SearchOrchestrator {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        vectors: QueryVectorSource,
        builder: QueryBuilder,
        index: impl Into<String>,
    ) -> Self {
        Self { backend, vectors, builder, index: index.into(), max_limit: MAX_LIMIT }
    }

    #[must_use]
    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub async fn search(&self, text: &str, mode: SearchMode, offset: usize, limit: usize) -> Result<SearchResult> {
        self.execute(&SearchRequest::new(text, mode).page(offset, limit)).await
    }

    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResult> {
        if request.is_blank() {
            return Ok(Vec::new());
        }
        request.validate(self.max_limit)?;
        let started = Instant::now();

        let vector = if request.mode.needs_query_vector() {
            Some(self.vectors.acquire(&request.query_text).await?)
        } else {
            None
        };
        let Some(body) =
            self.builder.build(&request.query_text, request.mode, request.offset, request.limit, vector)?
        else {
            return Ok(Vec::new());
        };

        let hits = self.backend.search(&self.index, &body.to_value()).await?;
        info!("{} search returned {} hits in {:?}", request.mode, hits.len(), started.elapsed());
        Ok(hits.into_iter().map(|hit| hit.conference.with_score(hit.score)).collect())
    }
}
