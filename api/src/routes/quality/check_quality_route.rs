//! POST /check_quality and POST /check_quality_batch: background scoring.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use review_generator::Review;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::quality::quality_task::{BatchScoreEntry, QualityTaskResult, TaskAccepted},
};

/// Accepts one review and scores it on a spawned task.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/check_quality \
///   -H 'content-type: application/json' -d @review.json
/// ```
#[instrument(name = "check_quality_route", skip_all)]
pub async fn check_quality_route(
    State(state): State<AppState>,
    Json(review): Json<Review>,
) -> AppResult<Response> {
    let task_id = state.tasks.submit().await;

    let worker = state.clone();
    tokio::spawn(async move {
        match worker.scorer.check_quality(&review).await {
            Ok(report) => {
                worker
                    .tasks
                    .complete(task_id, QualityTaskResult::Single(report))
                    .await
            }
            Err(e) => {
                error!(%task_id, error = %e, "quality check failed");
                worker.tasks.fail(task_id, e.to_string()).await
            }
        }
    });

    info!(%task_id, "quality check accepted");
    Ok(accepted(task_id, "质量检查任务已提交，请使用task_id查询结果"))
}

/// Accepts a list of reviews; each one is scored independently.
#[instrument(name = "check_quality_batch_route", skip_all)]
pub async fn check_quality_batch_route(
    State(state): State<AppState>,
    Json(reviews): Json<Vec<Review>>,
) -> AppResult<Response> {
    if reviews.is_empty() {
        return Err(AppError::BadRequest("reviews must not be empty".into()));
    }
    let task_id = state.tasks.submit().await;
    let count = reviews.len();

    let worker = state.clone();
    tokio::spawn(async move {
        let results = worker
            .scorer
            .check_quality_batch(&reviews)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, r)| BatchScoreEntry::from_result(i, r))
            .collect();
        worker
            .tasks
            .complete(task_id, QualityTaskResult::Batch { results })
            .await;
    });

    info!(%task_id, count, "batch quality check accepted");
    Ok(accepted(task_id, "批量质量检查任务已提交，请使用task_id查询结果"))
}

fn accepted(task_id: Uuid, message: &'static str) -> Response {
    ApiResponse::success(TaskAccepted {
        task_id,
        status: "processing",
        message,
    })
    .into_response_with_status(StatusCode::ACCEPTED)
}
