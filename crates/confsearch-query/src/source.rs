use std::sync::Arc;

use confsearch_core::traits::EmbeddingClient;
use confsearch_core::Result;

use crate::builder::QueryVector;

/// How the vector half of a query is obtained.
#[derive(Clone)]
pub enum QueryVectorSource {
    /// Embed the query text locally, one call per query.
    Local(Arc<dyn EmbeddingClient>),
    /// Let the backend embed the text with a deployed model.
    BackendInference { model_id: String },
}

impl QueryVectorSource {
    /// Picks `BackendInference` for clients that leave vectors to the backend.
    pub fn for_client(client: Arc<dyn EmbeddingClient>, inference_model_id: &str) -> Self {
        if client.computes_vectors() {
            Self::Local(client)
        } else {
            Self::BackendInference { model_id: inference_model_id.to_string() }
        }
    }

    pub async fn acquire(&self, text: &str) -> Result<QueryVector> {
        match self {
            Self::Local(client) => Ok(QueryVector::Embedded(client.embed_one(text).await?)),
            Self::BackendInference { model_id } => Ok(QueryVector::Inference {
                model_id: model_id.clone(),
                model_text: text.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for QueryVectorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(client) => write!(f, "Local({})", client.name()),
            Self::BackendInference { model_id } => write!(f, "BackendInference({model_id})"),
        }
    }
}
