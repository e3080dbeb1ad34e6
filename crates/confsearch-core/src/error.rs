use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::types::ConferenceId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding failed{}: {message}", batch_label(*.batch))]
    Embedding { batch: Option<usize>, message: String },

    #[error("Bulk write into '{index}' rejected {failed}/{total} operations (batch {batch})")]
    BulkWrite { index: String, batch: usize, failed: usize, total: usize },

    #[error("{operation} on index '{index}' failed: {source}")]
    Backend {
        operation: &'static str,
        index: String,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    Indexing(IndexingFailure),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Batch {batch} exceeded its deadline of {limit:?}")]
    Timeout { batch: usize, limit: Duration },

    #[error("Invalid input data: {0}")]
    Data(String),

    #[error("Worker job ended without a result: {0}")]
    Worker(String),
}

fn batch_label(batch: Option<usize>) -> String {
    batch.map(|b| format!(" for batch {b}")).unwrap_or_default()
}

impl Error {
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding { batch: None, message: message.into() }
    }

    pub fn backend(
        operation: &'static str,
        index: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Backend { operation, index: index.into(), source: source.into() }
    }

    /// Tags an embedding failure with the batch it happened in.
    #[must_use]
    pub fn in_batch(self, batch: usize) -> Self {
        match self {
            Self::Embedding { message, .. } => Self::Embedding { batch: Some(batch), message },
            other => other,
        }
    }
}

/// One batch that did not make it into the index.
#[derive(Debug)]
pub struct BatchFailure {
    pub batch: usize,
    pub ids: Vec<ConferenceId>,
    pub error: Error,
}

/// Aggregate outcome of an indexing run in which at least one batch failed.
/// Batches not listed here were written and stay written.
#[derive(Debug)]
pub struct IndexingFailure {
    pub total_batches: usize,
    pub failures: Vec<BatchFailure>,
}

impl IndexingFailure {
    pub fn failed_ids(&self) -> impl Iterator<Item = &ConferenceId> {
        self.failures.iter().flat_map(|f| f.ids.iter())
    }
}

impl fmt::Display for IndexingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} batches failed", self.failures.len(), self.total_batches)?;
        for failure in &self.failures {
            write!(f, "; batch {}: {}", failure.batch, failure.error)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
