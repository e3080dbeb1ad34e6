//! `SearchBackend` over the Elasticsearch REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use confsearch_core::config::ElasticsearchSettings;
use confsearch_core::traits::{BulkOutcome, SearchBackend, Upsert};
use confsearch_core::types::{fields, Conference, SearchHit};
use confsearch_core::{Error, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

#[derive(Deserialize)]
struct Acknowledged {
    #[serde(default)]
    acknowledged: bool,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Deserialize)]
struct BulkItem {
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl ElasticsearchBackend {
    pub fn new(settings: &ElasticsearchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;
        let credentials = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };
        Ok(Self { client, base_url: settings.url.trim_end_matches('/').to_string(), credentials })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}/{}", self.base_url, path));
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn send(&self, operation: &'static str, index: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| Error::backend(operation, index, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::backend(operation, index, format!("HTTP {status}: {body}")))
    }

    async fn acknowledged(operation: &'static str, index: &str, response: Response) -> Result<bool> {
        let ack: Acknowledged = response.json().await.map_err(|e| Error::backend(operation, index, e))?;
        Ok(ack.acknowledged)
    }
}

/// NDJSON body: one action line and one source line per upsert.
fn bulk_body(operations: &[Upsert]) -> String {
    let mut body = String::new();
    for op in operations {
        body.push_str(&serde_json::json!({ "index": { "_id": op.id } }).to_string());
        body.push('\n');
        body.push_str(&op.document.to_string());
        body.push('\n');
    }
    body
}

fn hit_to_conference(hit: Hit) -> std::result::Result<SearchHit, serde_json::Error> {
    let mut source = match hit.source {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    source.entry(fields::ID).or_insert_with(|| Value::String(hit.id));
    let conference: Conference = serde_json::from_value(Value::Object(source))?;
    Ok(SearchHit { conference, score: hit.score })
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn exists(&self, index: &str) -> Result<bool> {
        let response = self
            .request(Method::HEAD, index)
            .send()
            .await
            .map_err(|e| Error::backend("exists", index, e))?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(Error::backend("exists", index, format!("HTTP {other}"))),
        }
    }

    async fn create(&self, index: &str, config: &Value) -> Result<bool> {
        let response = self.send("create", index, self.request(Method::PUT, index).json(config)).await?;
        Self::acknowledged("create", index, response).await
    }

    async fn delete(&self, index: &str) -> Result<bool> {
        let response = self.send("delete", index, self.request(Method::DELETE, index)).await?;
        Self::acknowledged("delete", index, response).await
    }

    async fn bulk(&self, index: &str, operations: &[Upsert]) -> Result<BulkOutcome> {
        if operations.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let request = self
            .request(Method::POST, &format!("{index}/_bulk"))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(bulk_body(operations));
        let response = self.send("bulk", index, request).await?;
        let parsed: BulkResponse = response.json().await.map_err(|e| Error::backend("bulk", index, e))?;

        let item_errors: Vec<&Value> =
            parsed.items.iter().flat_map(|item| item.values()).filter_map(|i| i.error.as_ref()).collect();
        if let Some(first) = item_errors.first() {
            warn!("Bulk into '{index}': {} item error(s), first: {first}", item_errors.len());
        }
        let failed = if parsed.errors { item_errors.len().max(1) } else { item_errors.len() };
        debug!("Bulk into '{index}': {} operations, {failed} failed", operations.len());
        Ok(BulkOutcome { total: operations.len(), failed })
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Vec<SearchHit>> {
        let request = self.request(Method::POST, &format!("{index}/_search")).json(body);
        let response = self.send("search", index, request).await?;
        let parsed: SearchResponse = response.json().await.map_err(|e| Error::backend("search", index, e))?;
        parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| hit_to_conference(hit).map_err(|e| Error::backend("search", index, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bulk_body_is_action_then_source_per_line() {
        let ops = vec![
            Upsert { id: "a".into(), document: json!({ "id": "a", "name": "A" }) },
            Upsert { id: "b".into(), document: json!({ "id": "b" }) },
        ];
        let body = bulk_body(&ops);
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(serde_json::from_str::<Value>(lines[0]).unwrap(), json!({ "index": { "_id": "a" } }));
        assert_eq!(serde_json::from_str::<Value>(lines[3]).unwrap(), json!({ "id": "b" }));
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn hit_without_id_in_source_takes_document_id() {
        let hit = Hit { id: "x9".into(), score: None, source: json!({ "name": "Slush" }) };
        let parsed = hit_to_conference(hit).unwrap();
        assert_eq!(parsed.conference.id, "x9");
        assert_eq!(parsed.score, None);
    }
}
