//! Domain types shared by the embedding, query and indexing crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Error, Result};

pub type ConferenceId = String;

/// Stored field names. These are the JSON keys of a document in the index.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const EMBEDDING: &str = "embedding";
    pub const GROUP_ID: &str = "groupId";
    pub const DESCRIPTION: &str = "description";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const FORMATTED_LOCATION: &str = "formattedLocation";
    pub const COUNTRY_DESCRIPTION: &str = "countryDescription";
    pub const ATTENDEES_COUNT: &str = "attendeesCount";
    pub const COMPANY_ATTENDEES_COUNT: &str = "companyAttendeesCount";
    pub const INVESTOR_ATTENDEES_COUNT: &str = "investorAttendeesCount";
    pub const ATTENDEE_NAMES: &str = "attendeeNamesConcatString";
    pub const INDUSTRY_SECTORS: &str = "industrySectorsConcatString";
    pub const INDUSTRY_GROUPS: &str = "industryGroupsConcatString";
    pub const INDUSTRY_CODES: &str = "industryCodesConcatString";

    /// Every stored field except the raw embedding vector.
    pub const PROJECTION: [&str; 15] = [
        ID,
        NAME,
        GROUP_ID,
        DESCRIPTION,
        START_DATE,
        END_DATE,
        FORMATTED_LOCATION,
        COUNTRY_DESCRIPTION,
        ATTENDEES_COUNT,
        COMPANY_ATTENDEES_COUNT,
        INVESTOR_ATTENDEES_COUNT,
        ATTENDEE_NAMES,
        INDUSTRY_SECTORS,
        INDUSTRY_GROUPS,
        INDUSTRY_CODES,
    ];
}

/// A conference record as stored in the search index.
///
/// - `id`: unique, opaque identifier; also the bulk upsert key
/// - text attributes feed both keyword matching and the embedding input
/// - `embedding`: absent until computed, constant dimensionality per index
/// - `score`: only set on query results, never serialized into the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    pub id: ConferenceId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub formatted_location: String,
    #[serde(default)]
    pub country_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_attendees_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor_attendees_count: Option<u32>,
    #[serde(default, rename = "attendeeNamesConcatString")]
    pub attendee_names: String,
    #[serde(default, rename = "industrySectorsConcatString")]
    pub industry_sectors: String,
    #[serde(default, rename = "industryGroupsConcatString")]
    pub industry_groups: String,
    #[serde(default, rename = "industryCodesConcatString")]
    pub industry_codes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(skip)]
    pub score: Option<f64>,
}

impl Conference {
    /// Returns a copy carrying `embedding`; the receiver is left untouched.
    #[must_use]
    pub fn with_embedding(&self, embedding: Vec<f32>) -> Self {
        Self { embedding: Some(embedding), ..self.clone() }
    }

    #[must_use]
    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.embedding.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// Retrieval strategy for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SearchMode {
    Keyword,
    Vector,
    Hybrid,
}

impl SearchMode {
    /// Parses `KEYWORD`, `VECTOR` or `HYBRID`. Anything else is a programmer
    /// or configuration mistake and is rejected immediately.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse::<Self>()
            .map_err(|_| Error::Configuration(format!("Unknown search type: {s}")))
    }

    pub fn needs_query_vector(self) -> bool {
        matches!(self, Self::Vector | Self::Hybrid)
    }
}

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// One query, as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query_text: String,
    #[serde(default = "default_mode", rename = "searchType")]
    pub mode: SearchMode,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_mode() -> SearchMode {
    SearchMode::Hybrid
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl SearchRequest {
    pub fn new(query_text: impl Into<String>, mode: SearchMode) -> Self {
        Self { query_text: query_text.into(), mode, offset: 0, limit: DEFAULT_LIMIT }
    }

    #[must_use]
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Blank text is not an error; it short-circuits to an empty result.
    pub fn is_blank(&self) -> bool {
        self.query_text.trim().is_empty()
    }

    pub fn validate(&self, max_limit: usize) -> Result<()> {
        if self.limit == 0 || self.limit > max_limit {
            return Err(Error::Configuration(format!(
                "limit must be within 1..={max_limit}, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// A single hit as returned by the backend, before it is attached to a
/// result list. `score` is whatever the backend reported, possibly nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub conference: Conference,
    pub score: Option<f64>,
}

/// Backend-ordered query results; scores are never computed client-side.
pub type SearchResult = Vec<Conference>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_mode_parses_known_names() {
        assert_eq!(SearchMode::parse("KEYWORD").unwrap(), SearchMode::Keyword);
        assert_eq!(SearchMode::parse("VECTOR").unwrap(), SearchMode::Vector);
        assert_eq!(SearchMode::parse("HYBRID").unwrap(), SearchMode::Hybrid);
        assert_eq!(SearchMode::Hybrid.to_string(), "HYBRID");
    }

    #[test]
    fn unknown_search_mode_is_configuration_error() {
        let err = SearchMode::parse("FUZZY").unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("FUZZY")));
    }

    #[test]
    fn score_and_embedding_stay_out_of_serialized_source() {
        let c = Conference { id: "c1".into(), name: "FinTech Summit".into(), ..Default::default() }
            .with_score(Some(3.5));
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("score").is_none());
        assert!(json.get("embedding").is_none());
        assert_eq!(json["name"], "FinTech Summit");
    }

    #[test]
    fn with_embedding_leaves_original_untouched() {
        let c = Conference { id: "c1".into(), ..Default::default() };
        let e = c.with_embedding(vec![0.1, 0.2]);
        assert!(!c.is_embedded());
        assert!(e.is_embedded());
        assert_eq!(e.id, c.id);
    }

    #[test]
    fn search_request_defaults_and_limits() {
        let req: SearchRequest = serde_json::from_str(r#"{"queryText":"fintech"}"#).unwrap();
        assert_eq!(req.mode, SearchMode::Hybrid);
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, DEFAULT_LIMIT);
        assert!(req.validate(MAX_LIMIT).is_ok());
        assert!(req.clone().page(0, 0).validate(MAX_LIMIT).is_err());
        assert!(req.page(0, 101).validate(MAX_LIMIT).is_err());
    }
}
