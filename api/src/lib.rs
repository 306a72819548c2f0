//! HTTP surface: review generation, enhancement, background quality checks,
//! stats and health.

pub mod core {
    pub mod app_state;
    pub mod http {
        pub mod response_envelope;
    }
}

mod error_handler;

mod middleware_layer {
    pub mod json_extractor;
}

mod routes {
    pub mod catalog {
        pub mod catalog_routes;
    }
    pub mod health {
        pub mod health_route;
    }
    pub mod quality {
        pub mod check_quality_route;
        pub mod quality_result_route;
        pub mod quality_task;
    }
    pub mod reviews {
        pub mod generate_response;
        pub mod generate_reviews_route;
    }
}

#[cfg(test)]
mod tests;

use ai_llm_service::error_handler::env_opt;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};
use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        catalog::catalog_routes::{categories_route, review_stats_route},
        health::health_route::health_route,
        quality::{
            check_quality_route::{check_quality_batch_route, check_quality_route},
            quality_result_route::quality_result_route,
        },
        reviews::generate_reviews_route::{enhance_reviews_route, generate_reviews_route},
    },
};

const DEFAULT_ADDRESS: &str = "127.0.0.1:8000";

/// Builds the router over an already-constructed state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate_reviews", post(generate_reviews_route))
        .route("/enhance_reviews", post(enhance_reviews_route))
        .route("/categories", get(categories_route))
        .route("/review_stats/{category}", get(review_stats_route))
        .route("/health", get(health_route))
        .route("/check_quality", post(check_quality_route))
        .route("/check_quality_batch", post(check_quality_batch_route))
        .route("/quality_check_result/{task_id}", get(quality_result_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds state from the environment, starts the task sweeper and serves on
/// `API_ADDRESS` until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let host_url = env_opt("API_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    let state = AppState::from_env().await?;
    let sweeper = state.tasks.spawn_sweeper();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server);

    sweeper.abort();
    served
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
