use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};

use crate::metrics::OCR_REQUESTS_TOTAL;

/// Thresholds below which an on-device reading is replaced by the cloud one.
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    pub min_chars: usize,
    pub min_confidence: f32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_chars: 120,
            min_confidence: 60.0,
        }
    }
}

impl QualityGate {
    pub fn accepts_local(&self, text: &str, confidence: f32) -> bool {
        let text = text.trim();
        !text.is_empty() && text.chars().count() >= self.min_chars && confidence >= self.min_confidence
    }

    pub fn accepts_cloud(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_chars
    }
}

/// Strips an optional `data:<mime>;base64,` prefix and checks the payload decodes.
pub fn normalize_image(image_base64: &str) -> Result<String> {
    let trimmed = image_base64.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };
    general_purpose::STANDARD
        .decode(payload)
        .context("imageBase64 is not valid base64")?;
    Ok(payload.to_string())
}

/// Client for the document text detection endpoint.
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn annotate(&self, image_base64: &str, language_hints: Option<&[String]>) -> Result<String> {
        let url = format!(
            "{}/v1/images:annotate",
            self.base_url.trim_end_matches('/')
        );

        let mut request = json!({
            "image": { "content": image_base64 },
            "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
        });
        if let Some(hints) = language_hints {
            request["imageContext"] = json!({ "languageHints": hints });
        }

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": [request] }))
            .send()
            .await
            .map_err(|e| {
                OCR_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
                anyhow!("Failed to call Vision API: {}", e.without_url())
            })?;

        if !response.status().is_success() {
            OCR_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Vision API returned error {}: {}", status, error_text));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Vision API response: {}", e.without_url()))?;

        OCR_REQUESTS_TOTAL.with_label_values(&["success"]).inc();

        Ok(data
            .pointer("/responses/0/fullTextAnnotation/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
