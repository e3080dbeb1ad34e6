use std::sync::Arc;

use confsearch_core::traits::EmbeddingClient;
use confsearch_core::types::SearchMode;
use confsearch_embed::{BackendInference, FakeEmbedder};
use confsearch_query::{QueryBuilder, QueryVector, QueryVectorSource};

async fn body_for(source: &QueryVectorSource, text: &str, mode: SearchMode) -> Option<serde_json::Value> {
    let vector = if mode.needs_query_vector() && !text.trim().is_empty() {
        Some(source.acquire(text).await.expect("query vector"))
    } else {
        None
    };
    QueryBuilder::default()
        .build(text, mode, 0, 10, vector)
        .expect("build")
        .map(|b| b.to_value())
}

#[tokio::test]
async fn vector_and_hybrid_embed_the_query_exactly_once() {
    let fake = Arc::new(FakeEmbedder::new(8));
    let source = QueryVectorSource::Local(fake.clone());

    let body = body_for(&source, "ai summit", SearchMode::Hybrid).await.unwrap();
    assert_eq!(fake.calls(), 1);
    assert_eq!(body["knn"]["query_vector"].as_array().unwrap().len(), 8);
    assert!(body.get("query").is_some());

    body_for(&source, "ai summit", SearchMode::Vector).await.unwrap();
    assert_eq!(fake.calls(), 2);
}

#[tokio::test]
async fn keyword_never_embeds() {
    let fake = Arc::new(FakeEmbedder::new(8));
    let source = QueryVectorSource::Local(fake.clone());

    let body = body_for(&source, "ai summit", SearchMode::Keyword).await.unwrap();

    assert_eq!(fake.calls(), 0);
    assert!(body.get("knn").is_none());
}

#[tokio::test]
async fn same_text_gives_same_query_vector() {
    let source = QueryVectorSource::Local(Arc::new(FakeEmbedder::new(16)));
    let a = source.acquire("berlin tech week").await.unwrap();
    let b = source.acquire("berlin tech week").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn backend_inference_source_defers_embedding_to_the_backend() {
    let client: Arc<dyn EmbeddingClient> = Arc::new(BackendInference::new("embeddinggemma"));
    let source = QueryVectorSource::for_client(client, "embeddinggemma");
    assert!(matches!(source, QueryVectorSource::BackendInference { .. }));

    let body = body_for(&source, "climate", SearchMode::Vector).await.unwrap();
    assert_eq!(body["knn"]["query_vector_builder"]["text_embedding"]["model_text"], "climate");
}

#[tokio::test]
async fn local_clients_get_local_source() {
    let source = QueryVectorSource::for_client(Arc::new(FakeEmbedder::new(4)), "unused");
    assert!(matches!(source.acquire("x").await.unwrap(), QueryVector::Embedded(v) if v.len() == 4));
}

#[tokio::test]
async fn blank_query_builds_no_request() {
    let fake = Arc::new(FakeEmbedder::new(8));
    let source = QueryVectorSource::Local(fake.clone());
    assert!(body_for(&source, "", SearchMode::Hybrid).await.is_none());
    assert_eq!(fake.calls(), 0);
}

#[test]
fn paging_passes_through_to_from_and_size() {
    let body = QueryBuilder::default().keyword("x", 40, 20).to_value();
    assert_eq!((body["from"].as_u64(), body["size"].as_u64()), (Some(40), Some(20)));
}
