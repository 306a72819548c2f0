//! POST /generate_reviews and POST /enhance_reviews

use std::time::Instant;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use review_generator::{GenError, ReviewRequest};
use tracing::{error, info, instrument, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::reviews::generate_response::GenerateReviewsResponse,
};

/// Generates `num_reviews` reviews and appends them to the review store.
///
/// Items that fell back to a lower tier are still returned; `outcomes`
/// says which. Only a batch in which every item failed is an error. A store
/// failure is logged and reported in `save_error`; the reviews still come back.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/generate_reviews \
///   -H 'content-type: application/json' \
///   -d '{"user_background":{"occupation":"软件开发工程师","age":32},
///        "product_info":{"name":"ProBook X5","category":"electronics","features":["长续航"]},
///        "num_reviews":2}'
/// ```
#[instrument(name = "generate_reviews_route", skip_all)]
pub async fn generate_reviews_route(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Response> {
    run(&state, request, false).await
}

/// Same as `/generate_reviews`, then passes every review through the enhancer.
#[instrument(name = "enhance_reviews_route", skip_all)]
pub async fn enhance_reviews_route(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Response> {
    run(&state, request, true).await
}

async fn run(state: &AppState, request: ReviewRequest, enhance: bool) -> AppResult<Response> {
    let category = request.validate()?;
    let started = Instant::now();

    let report = state
        .pipeline
        .generate_batch(
            &request.user_background,
            &request.product_info,
            request.num_reviews as usize,
        )
        .await;

    let requested = report.items.len();
    if report.failed_count() == requested {
        // Every item carries the same terminal error; surface the first.
        return Err(report
            .into_all_or_nothing()
            .err()
            .unwrap_or(GenError::AllStrategiesFailed {
                product: request.product_info.name,
            })
            .into());
    }

    let (mut reviews, outcomes) = report.into_partial();
    if enhance {
        reviews = state.enhancer.enhance_all(&reviews).await;
    }
    let generation_time = started.elapsed().as_secs_f64();

    let (saved, save_error) = match state.reviews.save_reviews(&reviews, category.key()).await {
        Ok(saved) => {
            if saved.rejected > 0 {
                warn!(rejected = saved.rejected, "some reviews were not persisted");
            }
            (Some(saved), None)
        }
        Err(e) => {
            error!(category = %category, error = %e, "failed to save generated reviews");
            (None, Some(e.to_string()))
        }
    };

    info!(
        category = %category,
        returned = reviews.len(),
        enhanced = enhance,
        generation_time,
        "reviews generated"
    );

    Ok(ApiResponse::success(GenerateReviewsResponse {
        reviews,
        outcomes,
        generation_time,
        saved,
        save_error,
    })
    .into_response_with_status(StatusCode::OK))
}
