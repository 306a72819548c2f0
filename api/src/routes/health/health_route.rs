//! GET /health

use ai_llm_service::health_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every model backend answered, `degraded` otherwise.
    pub status: &'static str,
    pub pending_tasks: usize,
    pub models: Vec<HealthStatus>,
}

/// Always 200: the service itself is up even when a backend is not.
pub async fn health_route(State(state): State<AppState>) -> Response {
    let models = state.health.probe().await;
    let healthy = models.iter().all(|m| m.ok);
    if !healthy {
        warn!(
            failing = models.iter().filter(|m| !m.ok).count(),
            "model backend unhealthy"
        );
    }

    ApiResponse::success(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        pending_tasks: state.tasks.len().await,
        models,
    })
    .into_response_with_status(StatusCode::OK)
}
