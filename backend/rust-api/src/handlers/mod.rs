use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics;
use crate::services::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let credentials = &state.config.credentials;
    let missing = credentials.missing();
    let status = if missing.is_empty() {
        "healthy"
    } else {
        "degraded"
    };

    // Still 200: the process is up, only some tasks will fail
    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "service": "sway3-api",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "credentials": {
                "generative": credentials.generative().is_ok(),
                "ocr": credentials.ocr().is_ok(),
            },
            "missing": missing,
        })),
    )
}

/// Answers CORS preflight and bare OPTIONS probes.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Guards `/metrics` with HTTP Basic auth against `METRICS_AUTH` (user:password).
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let supplied = basic_credentials(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());

    if supplied != expected {
        tracing::warn!("Rejected /metrics scrape with bad credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

fn basic_credentials(headers: &HeaderMap) -> Option<String> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(decoded).ok()
}


pub mod ocr;
pub mod tasks;
