use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};

use crate::error::AppError;

/// JSON body extractor that ignores the content type (some mobile clients post
/// JSON as text/plain) and rejects bad bodies with a JSON 400.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read request body: {}", e)))?;

        serde_json::from_slice::<T>(&bytes)
            .map(AppJson)
            .map_err(|e| AppError::InvalidRequest(format!("Failed to parse JSON request body: {}", e)))
    }
}
