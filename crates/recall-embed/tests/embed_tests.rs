use recall_core::config::{ProviderKind, Settings};
use recall_core::{EmbeddingProvider, Error, TaskMode};
use recall_embed::{get_default_embedder, provider_from_settings, GeminiProvider, OpenAiProvider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid network calls
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    assert_eq!(embedder.embedder_id(), "fake:d256");
    let v1 = embedder.embed("hello world", None, TaskMode::Document).expect("embed");
    let v2 = embedder.embed("hello world", None, TaskMode::Document).expect("embed");

    assert_eq!(v1.len(), 256, "embedding dim is 256");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_dimension_follows_settings() {
    let mut settings = Settings::default();
    settings.embedding.provider = ProviderKind::Fake;
    settings.embedding.fake_dim = 32;
    let p = provider_from_settings(&settings).expect("fake provider");
    assert_eq!(p.embed("abc", None, TaskMode::Query).expect("embed").len(), 32);
}

fn can_bind() -> bool {
    if std::net::TcpListener::bind("127.0.0.1:0").is_err() {
        println!("Skipping test due to sandbox network bind restrictions.");
        return false;
    }
    true
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gemini_sends_task_type_and_title() {
    if !can_bind() { return; }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/text-embedding-004:embedContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "taskType": "RETRIEVAL_DOCUMENT",
            "title": "remote-work",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": { "values": [0.1, 0.2, 0.3] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let v = tokio::task::spawn_blocking(move || -> recall_core::Result<Vec<f32>> {
        let p = GeminiProvider::new("test-key")?.with_base_url(uri);
        p.embed("Requests must be submitted by 6pm.", Some("remote-work"), TaskMode::Document)
    })
    .await
    .expect("join")
    .expect("embed");
    assert_eq!(v, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gemini_api_error_is_embedding_failure() {
    if !can_bind() { return; }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = tokio::task::spawn_blocking(move || -> recall_core::Result<Vec<f32>> {
        let p = GeminiProvider::new("test-key")?.with_base_url(uri);
        p.embed("q", None, TaskMode::Query)
    })
    .await
    .expect("join")
    .unwrap_err();
    match err {
        Error::EmbeddingFailure { provider, message } => {
            assert_eq!(provider, "Gemini");
            assert!(message.contains("Resource has been exhausted"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gemini_malformed_body_is_embedding_failure() {
    if !can_bind() { return; }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let res = tokio::task::spawn_blocking(move || -> recall_core::Result<Vec<f32>> {
        let p = GeminiProvider::new("test-key")?.with_base_url(uri);
        p.embed("q", None, TaskMode::Query)
    })
    .await
    .expect("join");
    assert!(matches!(res, Err(Error::EmbeddingFailure { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn openai_posts_embeddings_with_bearer_auth() {
    if !can_bind() { return; }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "text-embedding-3-small",
            "input": ["snacks\nDrinks are free."],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "embedding": [1.0, 0.0] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let v = tokio::task::spawn_blocking(move || -> recall_core::Result<Vec<f32>> {
        let p = OpenAiProvider::new("sk-test")?.with_base_url(uri);
        p.embed("Drinks are free.", Some("snacks"), TaskMode::Document)
    })
    .await
    .expect("join")
    .expect("embed");
    assert_eq!(v, vec![1.0, 0.0]);
}
