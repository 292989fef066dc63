mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use sway3_api::config::Credentials;
use tower::ServiceExt;
use wiremock::MockServer;

use common::{create_test_app, mount_model, gemini_reply, post_json};

#[tokio::test]
async fn test_health_reports_credentials() {
    let upstream = MockServer::start().await;
    let app = create_test_app(common::test_config(&upstream));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "sway3-api");
    assert_eq!(body["credentials"], json!({ "generative": true, "ocr": true }));
    assert_eq!(body["missing"], json!([]));
}

#[tokio::test]
async fn test_health_is_degraded_without_keys() {
    let upstream = MockServer::start().await;
    let mut config = common::test_config(&upstream);
    config.credentials = Credentials::default();
    let app = create_test_app(config);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["missing"], json!(["GEMINI_API_KEY", "VISION_API_KEY"]));
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let upstream = MockServer::start().await;
    let app = create_test_app(common::test_config(&upstream));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-trace-id"], "trace-123");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-trace-id"));
}

#[tokio::test]
async fn test_metrics_require_basic_auth() {
    let upstream = MockServer::start().await;
    mount_model(&upstream, "model-a", gemini_reply("ok")).await;
    let app = create_test_app(common::test_config(&upstream));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Produce at least one task sample
    let (status, _) = post_json(
        &app,
        "/api/gemini",
        json!({ "task": "summary", "payload": { "text": "Lesson" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header(
                    "authorization",
                    format!("Basic {}", general_purpose::STANDARD.encode(expected)),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("tasks_total"));
}
