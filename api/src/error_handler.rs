use ai_llm_service::AiLlmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quality_scorer::ScoreError;
use review_generator::GenError;
use review_store::StoreError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] AiLlmError),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    // --- Domain ---
    #[error(transparent)]
    Generation(#[from] GenError),

    #[error(transparent)]
    Scoring(#[from] ScoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A background task finished with an error.
    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::Generation(GenError::Validation(_))
            | AppError::Generation(GenError::UnsupportedCategory(_))
            | AppError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,

            AppError::Scoring(ScoreError::Orchestration(_)) => StatusCode::SERVICE_UNAVAILABLE,

            AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Generation(GenError::AllStrategiesFailed { .. })
            | AppError::Store(_)
            | AppError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Generation(GenError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Generation(GenError::UnsupportedCategory(_)) => "UNSUPPORTED_CATEGORY",
            AppError::Generation(GenError::AllStrategiesFailed { .. }) => "GENERATION_FAILED",
            AppError::Scoring(_) => "SCORING_UNAVAILABLE",
            AppError::Store(StoreError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::TaskFailed(_) => "TASK_FAILED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_status() {
        let cases = [
            (
                AppError::from(GenError::UnsupportedCategory("toys".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(GenError::AllStrategiesFailed {
                    product: "x".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(ScoreError::Orchestration("join".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::NotFound("task".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }
}
