use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{Language, Task};

/// Request-level failures, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// A credential the request needs is not configured.
    #[error("Missing {0} in environment")]
    Configuration(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid task")]
    InvalidTask { language: Language },

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Every candidate was exhausted and the last failure was an overload.
    #[error("Upstream overloaded during {task}: {details}")]
    ServiceUnavailable {
        task: Task,
        language: Language,
        details: String,
    },

    /// Every candidate was exhausted with a non-transient failure.
    #[error("Upstream failure during {task}: {details}")]
    UpstreamFailure {
        task: Task,
        language: Language,
        details: String,
    },

    #[error("OCR failed: {details}")]
    OcrFailure { language: Language, details: String },

    /// Neither the local nor the cloud reading passed the quality gate.
    #[error("OCR text below quality gate")]
    TextUnclear { language: Language },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) | AppError::InvalidTask { .. } => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OcrFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TextUnclear { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Short message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::InvalidTask { language } => language
                .pick("Invalid task", "Tâche invalide", "مهمة غير صالحة")
                .to_string(),
            AppError::Configuration(_) | AppError::MethodNotAllowed => self.to_string(),
            AppError::ServiceUnavailable { language, .. } => language
                .pick(
                    "The AI service is busy. Please try again.",
                    "Le service IA est occupé. Réessayez.",
                    "الخدمة مشغولة. أعد المحاولة.",
                )
                .to_string(),
            AppError::UpstreamFailure { task, language, .. } => format!(
                "{} ({})",
                language.pick(
                    "Gemini API call failed",
                    "Échec de l'appel au service IA",
                    "فشل الاتصال بخدمة الذكاء الاصطناعي",
                ),
                task
            ),
            AppError::OcrFailure { language, .. } => language
                .pick(
                    "OCR failed",
                    "Échec de la reconnaissance du texte",
                    "فشل التعرف على النص",
                )
                .to_string(),
            AppError::TextUnclear { language } => language
                .pick(
                    "Text unclear. Please retake with better lighting or crop closer.",
                    "Texte illisible. Reprenez la photo avec un meilleur éclairage ou un cadrage plus serré.",
                    "النص غير واضح. أعد التصوير بإضاءة أفضل أو بإطار أقرب.",
                )
                .to_string(),
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            AppError::ServiceUnavailable { details, .. }
            | AppError::UpstreamFailure { details, .. }
            | AppError::OcrFailure { details, .. } => Some(details),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        let mut body = json!({ "error": self.user_message() });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}
