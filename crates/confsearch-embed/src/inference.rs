use async_trait::async_trait;

use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::Conference;
use confsearch_core::{Error, Result};

/// The search backend owns the model: documents are written without vectors
/// and query vectors are built server-side from `model_id`.
pub struct BackendInference {
    model_id: String,
}

impl BackendInference {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self { model_id: model_id.into() }
    }
}

#[async_trait]
impl EmbeddingClient for BackendInference {
    fn name(&self) -> &str {
        "inference"
    }

    fn computes_vectors(&self) -> bool {
        false
    }

    async fn embed_one(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Configuration(format!(
            "query vectors are computed by the search backend (model '{}')",
            self.model_id
        )))
    }

    async fn embed_batch(&self, conferences: &[Conference]) -> Result<Vec<Conference>> {
        Ok(conferences.to_vec())
    }
}
