//! GET /categories and GET /review_stats/{category}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use review_generator::Category;
use review_store::ReviewStats;
use serde::Serialize;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
};

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub key: &'static str,
    pub display_name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryEntry>,
}

pub async fn categories_route() -> Response {
    let categories = Category::ALL
        .into_iter()
        .map(|c| CategoryEntry {
            key: c.key(),
            display_name: c.profile().display_name,
        })
        .collect();
    ApiResponse::success(CategoriesResponse { categories }).into_response_with_status(StatusCode::OK)
}

pub async fn review_stats_route(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Response> {
    let stats: ReviewStats = state.reviews.stats(&category).await?;
    Ok(ApiResponse::success(stats).into_response_with_status(StatusCode::OK))
}
