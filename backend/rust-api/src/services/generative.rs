use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::models::ErrorClass;

const RAW_DUMP_LIMIT: usize = 4000;

lazy_static! {
    static ref OVERLOAD_RE: Regex = Regex::new(r"(?i)overloaded|503").unwrap();
}

/// Normalized failure from the generative service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        classify(self.status, &self.message)
    }
}

/// Maps a status/message pair to the retry class used by the dispatcher.
pub fn classify(status: Option<u16>, message: &str) -> ErrorClass {
    match status {
        Some(404) => ErrorClass::NotFound,
        Some(503) => ErrorClass::Overloaded,
        _ if OVERLOAD_RE.is_match(message) => ErrorClass::Overloaded,
        _ => ErrorClass::Other,
    }
}

/// Resolved model reference, ready to be called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub id: String,
    pub endpoint: Url,
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn model_handle(&self, model_id: &str) -> Result<ModelHandle, UpstreamError>;

    async fn generate(&self, model: &ModelHandle, prompt: &str) -> Result<Value, UpstreamError>;
}

/// REST client for the `generateContent` endpoint.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn model_handle(&self, model_id: &str) -> Result<ModelHandle, UpstreamError> {
        let id = model_id.trim();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(UpstreamError::new(
                None,
                format!("Invalid model identifier: {:?}", model_id),
            ));
        }

        // Accept both "gemini-x" and "models/gemini-x"
        let path = id.strip_prefix("models/").unwrap_or(id);
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            path
        );
        let endpoint = Url::parse(&raw)
            .map_err(|e| UpstreamError::new(None, format!("Invalid model endpoint {}: {}", raw, e)))?;

        Ok(ModelHandle {
            id: id.to_string(),
            endpoint,
        })
    }

    async fn generate(&self, model: &ModelHandle, prompt: &str) -> Result<Value, UpstreamError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(model.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            // the request URL carries the API key
            .map_err(|e| {
                UpstreamError::new(e.status().map(|s| s.as_u16()), e.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::new(
                Some(status.as_u16()),
                upstream_message(status, &error_text),
            ));
        }

        response.json::<Value>().await.map_err(|e| {
            UpstreamError::new(None, format!("Failed to parse model response: {}", e.without_url()))
        })
    }
}

fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());
    format!("[{}] {}", status, detail)
}

/// Pulls plain text out of whichever response shape the provider returned.
pub fn extract_text(response: &Value) -> String {
    if let Some(text) = response.get("text").and_then(Value::as_str) {
        return text.to_string();
    }

    if let Some(text) = response
        .get("response")
        .and_then(|r| r.get("text"))
        .and_then(Value::as_str)
    {
        return text.to_string();
    }

    if let Some(parts) = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let texts: Vec<&str> = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if !texts.is_empty() {
            return texts.concat();
        }
    }

    let raw = response.to_string();
    crate::services::prompt_builder::truncate_chars(&raw, RAW_DUMP_LIMIT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn classify_by_status_and_message() {
        assert_eq!(classify(Some(404), "model not found"), ErrorClass::NotFound);
        assert_eq!(classify(Some(503), "unavailable"), ErrorClass::Overloaded);
        assert_eq!(
            classify(None, "The model is OVERLOADED right now"),
            ErrorClass::Overloaded
        );
        assert_eq!(classify(Some(500), "[503 Service Unavailable]"), ErrorClass::Overloaded);
        assert_eq!(classify(Some(400), "bad request"), ErrorClass::Other);
        assert_eq!(classify(None, "connection reset"), ErrorClass::Other);
    }

    #[test]
    fn not_found_wins_over_overload_text() {
        assert_eq!(classify(Some(404), "overloaded"), ErrorClass::NotFound);
    }

    #[test]
    fn extract_text_handles_known_shapes() {
        assert_eq!(extract_text(&json!({ "text": "plain" })), "plain");
        assert_eq!(
            extract_text(&json!({ "response": { "text": "nested" } })),
            "nested"
        );
        assert_eq!(
            extract_text(&json!({
                "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] } }]
            })),
            "Hello world"
        );
    }

    #[test]
    fn extract_text_falls_back_to_truncated_dump() {
        let value = json!({ "unexpected": "x".repeat(5000) });
        let out = extract_text(&value);
        assert!(out.starts_with("{\"unexpected\""));
        assert_eq!(out.chars().count(), RAW_DUMP_LIMIT);
    }

    #[test]
    fn model_handle_rejects_blank_ids() {
        let backend = GeminiBackend::new(Client::new(), "http://localhost", "k");
        assert!(backend.model_handle("  ").is_err());
        assert!(backend.model_handle("bad id").is_err());

        let handle = backend.model_handle("models/text-bison-001").unwrap();
        assert_eq!(handle.id, "models/text-bison-001");
        assert_eq!(
            handle.endpoint.as_str(),
            "http://localhost/models/text-bison-001:generateContent"
        );
    }

    #[tokio::test]
    async fn generate_posts_prompt_and_returns_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "secret"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{ "text": "Hi" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Hello!" }] } }]
            })))
            .mount(&mock_server)
            .await;

        let backend = GeminiBackend::new(Client::new(), mock_server.uri(), "secret");
        let handle = backend.model_handle("gemini-2.0-flash").unwrap();
        let value = backend.generate(&handle, "Hi").await.unwrap();
        assert_eq!(extract_text(&value), "Hello!");
    }

    #[tokio::test]
    async fn generate_maps_error_status_and_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "code": 503, "message": "The model is overloaded." }
            })))
            .mount(&mock_server)
            .await;

        let backend = GeminiBackend::new(Client::new(), mock_server.uri(), "secret");
        let handle = backend.model_handle("gemini-1.5-flash").unwrap();
        let err = backend.generate(&handle, "Hi").await.unwrap_err();

        assert_eq!(err.status, Some(503));
        assert!(err.message.contains("The model is overloaded."));
        assert!(!err.message.contains("secret"));
        assert_eq!(err.class(), ErrorClass::Overloaded);
    }
}
