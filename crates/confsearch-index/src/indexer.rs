//! Concurrent batch indexing: partition, embed, bulk-write, then report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use confsearch_core::error::{BatchFailure, IndexingFailure};
use confsearch_core::traits::{EmbeddingClient, SearchBackend, Upsert};
use confsearch_core::types::Conference;
use confsearch_core::{Error, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::pool::WorkerPool;

/// Summary of a fully successful indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub batches: usize,
    pub elapsed: Duration,
}

/// Everything a batch needs, shared by all jobs of one run.
#[derive(Clone)]
struct BatchContext {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn EmbeddingClient>,
    index: String,
    dimensions: Option<usize>,
    batch_timeout: Option<Duration>,
    progress: ProgressBar,
}

pub struct BatchIndexer {
    ctx: BatchContext,
    pool: Arc<WorkerPool>,
    batch_size: usize,
}

/// Splits `conferences` into `ceil(N / batch_size)` contiguous batches, all
/// of size `batch_size` except possibly the last.
pub fn partition(conferences: &[Conference], batch_size: usize) -> Vec<Vec<Conference>> {
    conferences.chunks(batch_size.max(1)).map(<[Conference]>::to_vec).collect()
}

impl BatchIndexer {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn EmbeddingClient>,
        pool: Arc<WorkerPool>,
        index: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        let ctx = BatchContext {
            backend,
            embedder,
            index: index.into(),
            dimensions: None,
            batch_timeout: None,
            progress: ProgressBar::hidden(),
        };
        Self { ctx, pool, batch_size: batch_size.max(1) }
    }

    /// Deadline for one batch, covering both its embedding and its write.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ctx.batch_timeout = timeout;
        self
    }

    /// Rejects locally computed vectors of any other length.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.ctx.dimensions = Some(dimensions);
        self
    }

    /// Advances `progress` by the size of each written batch.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.ctx.progress = progress;
        self
    }

    /// Indexes `conferences` in parallel batches and waits for all of them.
    ///
    /// Succeeds only if every batch was embedded and written without item
    /// errors. Otherwise returns `Error::Indexing` listing each failed batch;
    /// batches that succeeded stay written.
    pub async fn index(&self, conferences: &[Conference], cancel: &CancelToken) -> Result<IndexReport> {
        let started = Instant::now();
        if conferences.is_empty() {
            debug!("Nothing to index");
            return Ok(IndexReport { documents: 0, batches: 0, elapsed: started.elapsed() });
        }

        let batches = partition(conferences, self.batch_size);
        let total_batches = batches.len();
        self.ctx.progress.set_length(conferences.len() as u64);
        info!(
            "Indexing {} conferences into '{}' in {total_batches} batches of up to {}",
            conferences.len(),
            self.ctx.index,
            self.batch_size
        );

        let ctx = Arc::new(self.ctx.clone());
        let mut pending = Vec::with_capacity(total_batches);
        for (number, batch) in batches.into_iter().enumerate() {
            let ids: Vec<String> = batch.iter().map(|c| c.id.clone()).collect();
            let job = run_batch(Arc::clone(&ctx), number, batch, cancel.clone());
            match self.pool.submit(job).await {
                Ok(handle) => pending.push((number, ids, Ok(handle))),
                Err(e) => pending.push((number, ids, Err(e))),
            }
        }

        let mut failures = Vec::new();
        for (batch, ids, handle) in pending {
            let outcome = match handle {
                Ok(handle) => handle.join().await.and_then(|r| r),
                Err(e) => Err(e),
            };
            if let Err(error) = outcome {
                warn!("Batch {batch} of {total_batches} failed: {error}");
                failures.push(BatchFailure { batch, ids, error });
            }
        }

        if failures.is_empty() {
            self.ctx.progress.finish();
            let report =
                IndexReport { documents: conferences.len(), batches: total_batches, elapsed: started.elapsed() };
            info!("Indexed {} conferences in {:?}", report.documents, report.elapsed);
            Ok(report)
        } else {
            self.ctx.progress.abandon();
            Err(Error::Indexing(IndexingFailure { total_batches, failures }))
        }
    }
}

async fn run_batch(ctx: Arc<BatchContext>, batch: usize, docs: Vec<Conference>, cancel: CancelToken) -> Result<usize> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let work = async {
        match ctx.batch_timeout {
            Some(limit) => tokio::time::timeout(limit, ctx.write_batch(batch, &docs))
                .await
                .map_err(|_| Error::Timeout { batch, limit })?,
            None => ctx.write_batch(batch, &docs).await,
        }
    };
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = work => result,
    }
}

impl BatchContext {
    async fn write_batch(&self, batch: usize, docs: &[Conference]) -> Result<usize> {
        let started = Instant::now();
        let documents = if self.embedder.computes_vectors() {
            let embedded = self.embedder.embed_batch(docs).await.map_err(|e| e.in_batch(batch))?;
            self.check_vectors(batch, docs, &embedded)?;
            embedded
        } else {
            docs.to_vec()
        };

        let operations = documents
            .iter()
            .map(|c| {
                serde_json::to_value(c)
                    .map(|document| Upsert { id: c.id.clone(), document })
                    .map_err(|e| Error::Data(format!("Conference {} is not serializable: {e}", c.id)))
            })
            .collect::<Result<Vec<_>>>()?;

        let outcome = self.backend.bulk(&self.index, &operations).await?;
        if outcome.has_errors() {
            return Err(Error::BulkWrite {
                index: self.index.clone(),
                batch,
                failed: outcome.failed,
                total: outcome.total,
            });
        }
        self.progress.inc(operations.len() as u64);
        info!("Batch {batch}: wrote {} conferences in {:?}", operations.len(), started.elapsed());
        Ok(operations.len())
    }

    fn check_vectors(&self, batch: usize, input: &[Conference], embedded: &[Conference]) -> Result<()> {
        let fail = |message: String| Err(Error::Embedding { batch: Some(batch), message });
        if embedded.len() != input.len() {
            return fail(format!("embedder returned {} documents for {}", embedded.len(), input.len()));
        }
        for conference in embedded {
            let len = conference.embedding.as_ref().map_or(0, Vec::len);
            if len == 0 {
                return fail(format!("conference {} has no embedding", conference.id));
            }
            if let Some(expected) = self.dimensions.filter(|d| *d != len) {
                return fail(format!("dim mismatch: got {len} expected {expected} for {}", conference.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: usize) -> Vec<Conference> {
        (0..n).map(|i| Conference { id: format!("c{i}"), ..Default::default() }).collect()
    }

    #[test]
    fn partition_sizes() {
        let sizes = |n, b| partition(&docs(n), b).iter().map(Vec::len).collect::<Vec<_>>();
        assert_eq!(sizes(120, 50), vec![50, 50, 20]);
        assert_eq!(sizes(100, 50), vec![50, 50]);
        assert_eq!(sizes(3, 10), vec![3]);
        assert!(sizes(0, 10).is_empty());
    }

    #[test]
    fn partition_keeps_order_and_covers_everything_once() {
        let input = docs(7);
        let flat: Vec<_> = partition(&input, 3).into_iter().flatten().map(|c| c.id).collect();
        assert_eq!(flat, input.into_iter().map(|c| c.id).collect::<Vec<_>>());
    }
}
