//! Integration tests for the summarizer HTTP API
//!
//! Both upstream providers are replaced by mockito servers; storage goes to a temp dir.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::path::Path;
use tower::ServiceExt;

use yt_summarizer::config::Config;
use yt_summarizer::pipeline::SummaryPipeline;
use yt_summarizer::server::{router, AppState};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=KrRD7r7y7NY";

fn test_config(upstream: &ServerGuard, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.transcript.endpoint = format!("{}/api/v1/search", upstream.url());
    config.transcript.api_key = Some("search-key".to_string());
    config.generation.endpoint = format!("{}/v1/chat/completions", upstream.url());
    config.generation.api_key = Some("deep-key".to_string());
    config.storage.data_dir = data_dir.to_path_buf();
    config
}

fn app(config: &Config) -> Router {
    router(AppState::new(SummaryPipeline::from_config(config)))
}

async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn post_summarize(app: &Router, body: Value) -> (StatusCode, Value) {
    make_request(app, Method::POST, "/summarize", Some(body)).await
}

async fn mock_transcripts(upstream: &mut ServerGuard, body: Value) -> Mock {
    upstream
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn mock_generation(upstream: &mut ServerGuard, status: usize, body: Value) -> Mock {
    upstream
        .mock("POST", "/v1/chat/completions")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn mock_hello_transcript(upstream: &mut ServerGuard) -> Mock {
    mock_transcripts(upstream, json!({"transcripts": [{"text": "hello"}]})).await
}

async fn mock_summary(upstream: &mut ServerGuard, content: &str) -> Mock {
    let body = json!({"choices": [{"message": {"role": "assistant", "content": content}}]});
    mock_generation(upstream, 200, body).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_progress_and_history_defaults() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let (status, body) = make_request(&app, Method::GET, "/progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ready");
    assert!(body["timestamp"].is_string());

    let (status, body) = make_request(&app, Method::GET, "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_summarize_success_end_to_end() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let transcripts = mock_transcripts(
        &mut upstream,
        json!({"transcripts": [{"text": "hello", "start": 0.0}, {"text": "world", "start": 0.8}]}),
    )
    .await;
    let generation = upstream
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer deep-key")
        .match_body(Matcher::Regex("hello world".to_string()))
        .with_status(200)
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "1. hello\n2. world"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"summary": "1. hello\n2. world", "video_id": "KrRD7r7y7NY"}));
    transcripts.assert_async().await;
    generation.assert_async().await;

    let saved = fs_err::read_to_string(dir.path().join("KrRD7r7y7NY_summary.md")).unwrap();
    assert_eq!(saved, "1. hello\n2. world");

    let (_, history) = make_request(&app, Method::GET, "/history", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["video_id"], "KrRD7r7y7NY");
    assert_eq!(history[0]["url"], VIDEO_URL);
    assert_eq!(history[0]["summary_file"], "KrRD7r7y7NY_summary.md");

    let (_, progress) = make_request(&app, Method::GET, "/progress", None).await;
    assert_eq!(progress["message"], "Generating summary...");
}

#[tokio::test]
async fn test_request_keys_override_defaults() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let transcripts = upstream
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::UrlEncoded("api_key".to_string(), "request-search".to_string()))
        .with_status(200)
        .with_body(json!({"transcripts": [{"text": "hi"}]}).to_string())
        .create_async()
        .await;
    let generation = upstream
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer request-deep")
        .with_status(200)
        .with_body(json!({"choices": [{"message": {"content": "1. hi"}}]}).to_string())
        .create_async()
        .await;

    let (status, body) = post_summarize(
        &app,
        json!({
            "url": "https://youtu.be/KrRD7r7y7NY",
            "searchapi_key": "request-search",
            "deepseek_key": "request-deep"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "1. hi");
    transcripts.assert_async().await;
    generation.assert_async().await;
}

#[tokio::test]
async fn test_malformed_reference_is_bad_request() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let (status, body) = post_summarize(&app, json!({"url": "not a url"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Could not extract YouTube video ID"));
}

#[tokio::test]
async fn test_missing_url_and_bad_body_are_bad_request() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let (status, body) = post_summarize(&app, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing YouTube URL");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/summarize")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_no_transcript_skips_generation() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = mock_transcripts(&mut upstream, json!({"transcripts": []})).await;
    let generation = upstream
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No transcripts available"));
    generation.assert_async().await;
}

#[tokio::test]
async fn test_authentication_failure_is_bad_request() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = mock_hello_transcript(&mut upstream).await;
    let _generation = mock_generation(
        &mut upstream,
        401,
        json!({
            "error": {
                "message": "Authentication Fails (no such user)",
                "type": "authentication_error"
            }
        }),
    )
    .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Authentication Fails (no such user)"));

    let (_, history) = make_request(&app, Method::GET, "/history", None).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_generation_failure_is_server_error() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = mock_hello_transcript(&mut upstream).await;
    let _generation = mock_generation(
        &mut upstream,
        503,
        json!({"error": {"message": "Server overloaded", "type": "server_error"}}),
    )
    .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Server overloaded"));
}

#[tokio::test]
async fn test_transcript_transport_failure_is_server_error() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = upstream
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("API Error"));
}

#[tokio::test]
async fn test_transcript_provider_message_is_reported() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = upstream
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": "Invalid API key."}).to_string())
        .create_async()
        .await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Invalid API key."), "{message}");
    assert!(!message.contains("search-key"));
}

#[tokio::test]
async fn test_missing_credentials_is_bad_request() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&upstream, dir.path());
    config.transcript.api_key = None;
    let app = app(&config);

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("API key is required"));
}

#[tokio::test]
async fn test_storage_failure_still_returns_summary() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    fs_err::write(&blocker, "").unwrap();
    let app = app(&test_config(&upstream, &blocker));

    let _transcripts = mock_hello_transcript(&mut upstream).await;
    let _generation = mock_summary(&mut upstream, "1. hello").await;

    let (status, body) = post_summarize(&app, json!({"url": VIDEO_URL})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "1. hello");
    assert_eq!(body["video_id"], "KrRD7r7y7NY");
}

#[tokio::test]
async fn test_history_grows_with_each_run() {
    let mut upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let _transcripts = mock_hello_transcript(&mut upstream).await;
    let _generation = mock_summary(&mut upstream, "1. hello").await;

    let urls = [VIDEO_URL, "https://youtu.be/dQw4w9WgXcQ", "KrRD7r7y7NY"];
    for url in urls {
        let (status, _) = post_summarize(&app, json!({"url": url})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = make_request(&app, Method::GET, "/history", None).await;
    let recorded: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["url"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(recorded, urls);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let upstream = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(&test_config(&upstream, dir.path()));

    let (status, body) = make_request(&app, Method::GET, "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
}
