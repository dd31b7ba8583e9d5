use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::RecommendationPipeline,
};

pub mod recommendations;

/// Shared state handed to every handler
pub struct AppState {
    pub pipeline: RecommendationPipeline,
}

impl AppState {
    pub fn new(pipeline: RecommendationPipeline) -> Self {
        Self { pipeline }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommendations::recommend))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "engine": "axum + LLM" })),
    )
}
