//! Ollama embedding backend against a mock HTTP server

use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use weaver_config::{LinkingConfig, RuleKind, VariantRule};
use weaver_core::{
    Corpus, Decision, Document, Engine, EngineOptions, RuleTable, SimilarityBackend,
    SimilarityError, SimilarityRefiner,
};
use weaver_llm::{MockSimilarity, OllamaSimilarity};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_embeddings() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "prompt": "alpha" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [1.0, 0.0, 0.0] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "prompt": "beta" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [1.0, 1.0, 0.0] })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_cosine_of_server_embeddings() {
    let server = server_with_embeddings().await;
    let backend = OllamaSimilarity::new(server.uri(), "nomic-embed-text", 5).unwrap();

    let sim = backend.similarity("alpha", "beta").await.unwrap();
    assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
}

#[tokio::test]
async fn test_embeddings_are_cached() {
    let server = server_with_embeddings().await;
    let backend = OllamaSimilarity::new(server.uri(), "nomic-embed-text", 5).unwrap();

    backend.similarity("alpha", "beta").await.unwrap();
    backend.similarity("beta", "alpha").await.unwrap();

    assert_eq!(backend.cached(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_http_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model not found"}"#))
        .mount(&server)
        .await;
    let backend = OllamaSimilarity::new(server.uri(), "missing", 5).unwrap();

    let err = backend.similarity("a", "b").await.unwrap_err();
    assert!(matches!(err, SimilarityError::Unavailable(_)));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "vector": [1.0] })))
        .mount(&server)
        .await;
    let backend = OllamaSimilarity::new(server.uri(), "m", 5).unwrap();

    let err = backend.similarity("a", "b").await.unwrap_err();
    assert!(matches!(err, SimilarityError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_server_falls_back_to_rule_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "embedding": [1.0] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    let backend = Arc::new(OllamaSimilarity::new(server.uri(), "m", 5).unwrap());
    let refiner = SimilarityRefiner::new(backend, 0.6, 0.4, Duration::from_millis(50), 2000);

    let engine = Engine::new(
        Corpus::new(vec![
            Document::parse("DB.md", "---\ntitle: DB\n---\nStorage engine notes\n"),
            Document::parse("n.md", "A database row.\n"),
        ]),
        &RuleTable::new(&[VariantRule::new(RuleKind::Abbreviation, "DB", &["database"])], 16),
        EngineOptions::new(LinkingConfig::default()),
        Some(refiner),
    )
    .unwrap();
    let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();

    assert!(engine.backend_lost());
    let n = analysis.documents.iter().find(|d| d.document_id == "n").unwrap();
    let target = n.candidates[0].decision.accepted().unwrap();
    assert_eq!(target.score, 0.75);
    assert_eq!(target.similarity, None);
}

#[tokio::test]
async fn test_low_similarity_discards_variant() {
    let backend = Arc::new(MockSimilarity::new().with_score("Storage", 0.0));
    let refiner = SimilarityRefiner::new(backend.clone(), 0.6, 0.4, Duration::from_secs(1), 2000);

    let engine = Engine::new(
        Corpus::new(vec![
            Document::parse("DB.md", "---\ntitle: DB\n---\nStorage engine notes\n"),
            Document::parse("n.md", "A database row.\n\nThe DB itself.\n"),
        ]),
        &RuleTable::new(&[VariantRule::new(RuleKind::Abbreviation, "DB", &["database"])], 16),
        EngineOptions::new(LinkingConfig::default()),
        Some(refiner),
    )
    .unwrap();
    let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();

    let n = analysis.documents.iter().find(|d| d.document_id == "n").unwrap();
    // 0.6 * 0.75 + 0.4 * 0.0 = 0.45, under the threshold
    assert_eq!(n.candidates[0].decision, Decision::Discarded);
    // The exact "DB" is never sent to the backend
    assert!(n.candidates[1].decision.accepted().is_some());
    assert_eq!(backend.call_count(), 1);
}
