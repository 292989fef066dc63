#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use sway3_api::{
    config::{Config, Credentials},
    create_router,
    services::AppState,
};
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const GEMINI_KEY: &str = "test-gemini-key";
pub const VISION_KEY: &str = "test-vision-key";

/// Config pointing both upstreams at the given mock server with millisecond backoff.
pub fn test_config(upstream: &MockServer) -> Config {
    Config {
        credentials: Credentials {
            generative_api_key: Some(GEMINI_KEY.to_string()),
            ocr_api_key: Some(VISION_KEY.to_string()),
        },
        generative_base_url: upstream.uri(),
        model_candidates: vec!["model-a".to_string(), "model-b".to_string()],
        backoff_schedule: vec![
            Duration::from_millis(0),
            Duration::from_millis(5),
            Duration::from_millis(10),
        ],
        ocr_base_url: upstream.uri(),
        ..Config::default()
    }
}

pub fn create_test_app(config: Config) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::new(config).expect("Failed to initialize test app state"));
    create_router(app_state)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    read_json(response).await
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn generate_path(model: &str) -> String {
    format!("/models/{}:generateContent", model)
}

pub fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

pub fn gemini_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": { "code": status, "message": message }
    }))
}

pub async fn mount_model(upstream: &MockServer, model: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(generate_path(model)))
        .and(query_param("key", GEMINI_KEY))
        .respond_with(response)
        .mount(upstream)
        .await;
}

pub async fn mount_vision(upstream: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .and(query_param("key", VISION_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "fullTextAnnotation": { "text": text } }]
        })))
        .mount(upstream)
        .await;
}
