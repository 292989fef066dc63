use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Runs the request inside a span keyed by the caller's `x-trace-id` (or a
/// fresh one) and echoes the id back, so a mobile client can quote it when a
/// task fails.
pub async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }

    response
}

fn incoming_trace_id(request: &Request) -> Option<String> {
    let value = request.headers().get(TRACE_ID_HEADER)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
