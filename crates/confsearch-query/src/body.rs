//! Search request body, serialized as the backend's query DSL.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    pub from: usize,
    pub size: usize,
    #[serde(rename = "_source")]
    pub source: SourceFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knn: Option<Knn>,
}

impl SearchBody {
    pub fn to_value(&self) -> serde_json::Value {
        // Plain data structs with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFilter {
    pub includes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub bool: BoolQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolQuery {
    pub must: Vec<MustClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MustClause {
    pub multi_match: MultiMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatch {
    pub query: String,
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub match_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Knn {
    pub field: &'static str,
    #[serde(flatten)]
    pub vector: KnnVector,
    pub k: usize,
    pub num_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum KnnVector {
    #[serde(rename = "query_vector")]
    Vector(Vec<f32>),
    #[serde(rename = "query_vector_builder")]
    Builder { text_embedding: TextEmbedding },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEmbedding {
    pub model_id: String,
    pub model_text: String,
}
