//! Self-hosted embedding server (text-embeddings-inference style).
//!
//! `POST {endpoint}/embed` with `{"inputs": "<text>"}`; the response is an
//! array of vectors and the first one is used.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use confsearch_core::text::TextBudget;
use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::Conference;
use confsearch_core::{Error, Result};

pub struct TeiEmbedder {
    client: reqwest::Client,
    url: String,
    budget: TextBudget,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

impl TeiEmbedder {
    pub fn new(endpoint: &str, budget: TextBudget, timeout_secs: u64) -> Result<Self> {
        let url = format!("{}/embed", endpoint.trim_end_matches('/'));
        Ok(Self { client: crate::http_client(timeout_secs)?, url, budget })
    }
}

#[async_trait]
impl EmbeddingClient for TeiEmbedder {
    fn name(&self) -> &str {
        "tei"
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { inputs: text })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("POST {}: {e}", self.url)))?;
        if !response.status().is_success() {
            return Err(crate::status_error(&self.url, response).await);
        }
        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Malformed /embed response: {e}")))?;
        let vector = vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::embedding("/embed returned no vectors"))?;
        debug!("Embedded {} chars in {:?}", text.len(), start.elapsed());
        Ok(vector)
    }

    async fn embed_batch(&self, conferences: &[Conference]) -> Result<Vec<Conference>> {
        crate::embed_each(self, &self.budget, conferences).await
    }
}
