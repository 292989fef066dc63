use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::AppError;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Browser and mobile clients call from arbitrary origins
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .route("/api/gemini", api_route(post(handlers::tasks::run_task)))
        .route("/api/ocr", api_route(post(handlers::ocr::recognize)))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// POST endpoint that also answers bare OPTIONS and turns other methods into a JSON 405.
fn api_route(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
