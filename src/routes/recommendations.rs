use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RecommendRequest, RecommendResponse},
    routes::AppState,
};

/// Retrieves candidates for the query and returns the reranker's pick
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> AppResult<Json<RecommendResponse>> {
    let Json(request) = body.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

    tracing::info!(
        request_id = %request_id,
        query_chars = request.query.len(),
        "Processing recommendation request"
    );

    let outcome = state.pipeline.recommend(&request.query).await?;

    tracing::info!(
        request_id = %request_id,
        selected = %outcome.recommendation.selected_title,
        candidates = outcome.candidates.len(),
        "Recommendation completed"
    );

    Ok(Json(RecommendResponse::new(request.query, outcome)))
}
