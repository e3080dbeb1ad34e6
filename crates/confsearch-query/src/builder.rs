use confsearch_core::config::SearchSettings;
use confsearch_core::types::{fields, SearchMode};
use confsearch_core::{Error, Result};
use tracing::debug;

use crate::body::{
    BoolQuery, Knn, KnnVector, MultiMatch, MustClause, Query, SearchBody, SourceFilter, TextEmbedding,
};

/// Keyword fields and their boosts. Name ranks highest; description,
/// location and the industry lists sit in the middle; attendees and
/// country count least.
pub const KEYWORD_FIELDS: [(&str, u32); 8] = [
    (fields::NAME, 3),
    (fields::DESCRIPTION, 2),
    (fields::FORMATTED_LOCATION, 2),
    (fields::COUNTRY_DESCRIPTION, 1),
    (fields::ATTENDEE_NAMES, 1),
    (fields::INDUSTRY_SECTORS, 2),
    (fields::INDUSTRY_GROUPS, 2),
    (fields::INDUSTRY_CODES, 2),
];

/// The vector half of a query: either a vector computed by the caller, or a
/// model reference the backend resolves itself.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryVector {
    Embedded(Vec<f32>),
    Inference { model_id: String, model_text: String },
}

/// Builds backend request bodies. Pure: no I/O, no shared state.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    k: usize,
    num_candidates: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(5, 100)
    }
}

impl QueryBuilder {
    /// `num_candidates` is raised to `k` if smaller.
    pub fn new(k: usize, num_candidates: usize) -> Self {
        Self { k, num_candidates: num_candidates.max(k) }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.k, settings.num_candidates)
    }

    /// `None` when `text` is blank: no request is built and the caller
    /// returns an empty result. Vector modes need `vector`; its absence is a
    /// wiring mistake, not a data error.
    pub fn build(
        &self,
        text: &str,
        mode: SearchMode,
        offset: usize,
        limit: usize,
        vector: Option<QueryVector>,
    ) -> Result<Option<SearchBody>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body = match (mode, vector) {
            (SearchMode::Keyword, _) => self.keyword(text, offset, limit),
            (SearchMode::Vector, Some(v)) => self.vector(v, offset, limit),
            (SearchMode::Hybrid, Some(v)) => self.hybrid(text, v, offset, limit),
            (mode, None) => {
                return Err(Error::Configuration(format!("{mode} search requires a query vector")))
            }
        };
        debug!("Built {mode} request: from={offset} size={limit}");
        Ok(Some(body))
    }

    pub fn keyword(&self, text: &str, offset: usize, limit: usize) -> SearchBody {
        SearchBody { query: Some(keyword_query(text)), ..page(offset, limit) }
    }

    pub fn vector(&self, vector: QueryVector, offset: usize, limit: usize) -> SearchBody {
        SearchBody { knn: Some(self.knn(vector)), ..page(offset, limit) }
    }

    /// Both halves in one request. Score fusion is left to the backend, which
    /// adds the keyword and kNN contributions for documents matched by both.
    pub fn hybrid(&self, text: &str, vector: QueryVector, offset: usize, limit: usize) -> SearchBody {
        SearchBody {
            query: Some(keyword_query(text)),
            knn: Some(self.knn(vector)),
            ..page(offset, limit)
        }
    }

    fn knn(&self, vector: QueryVector) -> Knn {
        let vector = match vector {
            QueryVector::Embedded(v) => KnnVector::Vector(v),
            QueryVector::Inference { model_id, model_text } => KnnVector::Builder {
                text_embedding: TextEmbedding { model_id, model_text },
            },
        };
        Knn { field: fields::EMBEDDING, vector, k: self.k, num_candidates: self.num_candidates }
    }
}

fn page(offset: usize, limit: usize) -> SearchBody {
    SearchBody {
        from: offset,
        size: limit,
        source: SourceFilter { includes: fields::PROJECTION.iter().map(|f| (*f).to_string()).collect() },
        query: None,
        knn: None,
    }
}

fn keyword_query(text: &str) -> Query {
    let fields = KEYWORD_FIELDS.iter().map(|(f, boost)| format!("{f}.text^{boost}")).collect();
    Query {
        bool: BoolQuery {
            must: vec![MustClause {
                multi_match: MultiMatch { query: text.to_string(), fields, match_type: "best_fields" },
            }],
        },
    }
}
