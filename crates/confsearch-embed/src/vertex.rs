//! Managed cloud embeddings through a predict-style endpoint.
//!
//! Request: `{"instances":[{"content","task_type"}],
//! "parameters":{"outputDimensionality","autoTruncate"}}`.
//! Response: `predictions[0].embeddings.values`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use confsearch_core::config::EmbeddingSettings;
use confsearch_core::text::TextBudget;
use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::Conference;
use confsearch_core::{Error, Result};

const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

pub struct VertexEmbedder {
    client: reqwest::Client,
    url: String,
    access_token: Option<String>,
    dimensions: usize,
    budget: TextBudget,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters,
}

#[derive(Serialize)]
struct Instance<'a> {
    content: &'a str,
    task_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    output_dimensionality: usize,
    auto_truncate: bool,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    embeddings: Embeddings,
}

#[derive(Deserialize)]
struct Embeddings {
    values: Vec<f32>,
}

impl VertexEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings, budget: TextBudget) -> Result<Self> {
        let v = &settings.vertex;
        if v.project_id.is_empty() {
            return Err(Error::Configuration("embedding.vertex.project_id is required".into()));
        }
        let base = v
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", v.region));
        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            base.trim_end_matches('/'),
            v.project_id,
            v.region,
            v.model
        );
        Ok(Self {
            client: crate::http_client(settings.timeout_secs)?,
            url,
            access_token: v.access_token.clone(),
            dimensions: settings.dimensions,
            budget,
        })
    }
}

#[async_trait]
impl EmbeddingClient for VertexEmbedder {
    fn name(&self) -> &str {
        "vertex"
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let body = PredictRequest {
            instances: [Instance { content: text, task_type: TASK_TYPE }],
            parameters: Parameters { output_dimensionality: self.dimensions, auto_truncate: true },
        };
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding(format!("predict call failed: {e}")))?;
        if !response.status().is_success() {
            return Err(crate::status_error("predict", response).await);
        }
        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Malformed predict response: {e}")))?;
        parsed
            .predictions
            .into_iter()
            .next()
            .map(|p| p.embeddings.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::embedding("predict returned no predictions"))
    }

    async fn embed_batch(&self, conferences: &[Conference]) -> Result<Vec<Conference>> {
        crate::embed_each(self, &self.budget, conferences).await
    }
}
