use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing imageBase64"))]
    pub image_base64: String,
    #[validate(length(max = 8))]
    pub language_hints: Option<Vec<String>>,
    /// On-device reading, if the client already ran one.
    pub local_text: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub local_confidence: Option<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrSource {
    Local,
    Cloud,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub text: String,
    pub source: OcrSource,
}
