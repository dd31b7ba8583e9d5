use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Retrieval produced no candidates
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The completion or embedding service failed or timed out
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// The completion call succeeded but its content was unusable
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable label used in logs so 500s stay distinguishable
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Upstream(_) => "upstream",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::Index(_) => "index",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_)
            | AppError::MalformedResponse(_)
            | AppError::Index(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("request timed out: {}", err))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::info!(kind = self.kind(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "detail": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
