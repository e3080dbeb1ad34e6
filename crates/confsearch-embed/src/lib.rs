//! confsearch-embed
//!
//! Embedding backends behind [`EmbeddingClient`]: a self-hosted `/embed`
//! endpoint, a managed predict endpoint, backend-side inference, and a
//! deterministic fake for tests and offline development.

use std::sync::Arc;
use std::time::Duration;

use confsearch_core::config::{EmbeddingProvider, EmbeddingSettings};
use confsearch_core::text::TextBudget;
use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::Conference;
use confsearch_core::{Error, Result};
use tracing::info;

pub mod fake;
pub mod inference;
pub mod tei;
pub mod vertex;

pub use fake::FakeEmbedder;
pub use inference::BackendInference;
pub use tei::TeiEmbedder;
pub use vertex::VertexEmbedder;

/// Embeds every conference on its own, in order, through `client.embed_one`.
/// The first failure aborts the batch.
pub(crate) async fn embed_each<C>(
    client: &C,
    budget: &TextBudget,
    conferences: &[Conference],
) -> Result<Vec<Conference>>
where
    C: EmbeddingClient + ?Sized,
{
    let mut embedded = Vec::with_capacity(conferences.len());
    for conference in conferences {
        let input = budget.embedding_input(conference);
        let vector = client.embed_one(&input).await?;
        embedded.push(conference.with_embedding(vector));
    }
    Ok(embedded)
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Reads a non-success response into an embedding error.
pub(crate) async fn status_error(what: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
    Error::embedding(format!("{what} returned {status}: {body}"))
}

/// Builds the embedding client selected by `settings.provider`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the fake embedder regardless of settings.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingClient>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let budget = TextBudget::new(settings.max_tokens, settings.chars_per_token);
    let provider = if use_fake { EmbeddingProvider::Fake } else { settings.provider };
    info!("Embedding provider: {:?}", provider);
    Ok(match provider {
        EmbeddingProvider::Tei => {
            Arc::new(TeiEmbedder::new(&settings.endpoint, budget, settings.timeout_secs)?)
        }
        EmbeddingProvider::Vertex => Arc::new(VertexEmbedder::from_settings(settings, budget)?),
        EmbeddingProvider::Inference => {
            Arc::new(BackendInference::new(settings.inference_model_id.clone()))
        }
        EmbeddingProvider::Fake => Arc::new(FakeEmbedder::new(settings.dimensions).with_budget(budget)),
    })
}
