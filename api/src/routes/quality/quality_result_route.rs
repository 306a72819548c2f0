//! GET /quality_check_result/{task_id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use review_store::TaskState;
use tracing::debug;
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::quality::quality_task::TaskPending,
};

/// Returns a finished result once; afterwards the id is unknown.
pub async fn quality_result_route(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let not_found = || AppError::NotFound(format!("task {task_id} does not exist"));
    let id = Uuid::parse_str(task_id.trim()).map_err(|_| not_found())?;

    match state.tasks.take(id).await {
        Some(TaskState::Completed(result)) => {
            debug!(%id, "quality result delivered");
            Ok(ApiResponse::success(result).into_response_with_status(StatusCode::OK))
        }
        Some(TaskState::Failed(message)) => Err(AppError::TaskFailed(message)),
        Some(TaskState::Processing) => Ok(ApiResponse::success(TaskPending {
            status: "processing",
            message: "质量检查任务正在处理中",
        })
        .into_response_with_status(StatusCode::OK)),
        None => Err(not_found()),
    }
}
