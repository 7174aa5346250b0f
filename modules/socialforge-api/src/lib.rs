//! HTTP surface for the presence-creation service.

pub mod auth;
pub mod rest;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use socialforge_orchestrator::Orchestrator;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Unset means signature checks are skipped (local development).
    pub webhook_secret: Option<String>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook/create-profiles", post(rest::create_profiles))
        .route("/status/{job_id}", get(rest::job_status))
        .route("/jobs", get(rest::list_jobs))
        .route("/jobs/{job_id}/retry", post(rest::retry_job))
        .route("/health", get(rest::health))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
