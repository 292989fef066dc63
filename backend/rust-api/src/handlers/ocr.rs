use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::{Language, OcrRequest, OcrResponse, OcrSource},
    services::{
        ocr_service::{normalize_image, QualityGate, VisionClient},
        AppState,
    },
};

pub async fn recognize(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<OcrRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| {
        let missing_image = e.field_errors().contains_key("image_base64");
        AppError::InvalidRequest(if missing_image {
            "Missing imageBase64".to_string()
        } else {
            format!("Invalid OCR request: {}", e)
        })
    })?;

    let gate = QualityGate {
        min_chars: state.config.ocr_min_chars,
        min_confidence: state.config.ocr_min_confidence,
    };
    let language = Language::from_code(
        req.language_hints
            .as_ref()
            .and_then(|hints| hints.first())
            .map(String::as_str),
    );

    // Undecodable images are rejected before either reading is considered
    let image = normalize_image(&req.image_base64)
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

    // A good enough on-device reading never leaves the client's hands
    if let Some(local) = req.local_text.as_deref() {
        let confidence = req.local_confidence.unwrap_or(0.0);
        if gate.accepts_local(local, confidence) {
            tracing::debug!(confidence, "Local OCR passed the quality gate");
            return Ok((
                StatusCode::OK,
                Json(OcrResponse {
                    text: local.trim().to_string(),
                    source: OcrSource::Local,
                }),
            ));
        }
        tracing::info!(confidence, "Local OCR below quality gate, escalating to cloud");
    }

    let api_key = state.config.credentials.ocr()?;

    let client = VisionClient::new(
        state.http.clone(),
        state.config.ocr_base_url.clone(),
        api_key,
    );
    let text = client
        .annotate(&image, req.language_hints.as_deref())
        .await
        .map_err(|e| AppError::OcrFailure {
            language,
            details: e.to_string(),
        })?;
    let text = text.trim().to_string();

    if req.local_text.is_some() && !gate.accepts_cloud(&text) {
        return Err(AppError::TextUnclear { language });
    }

    Ok((
        StatusCode::OK,
        Json(OcrResponse {
            text,
            source: OcrSource::Cloud,
        }),
    ))
}
