use review_generator::{ItemStatus, Review};
use review_store::SaveSummary;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenerateReviewsResponse {
    pub reviews: Vec<Review>,
    /// Per requested item, in request order.
    pub outcomes: Vec<ItemStatus>,
    /// Wall-clock seconds spent generating (and enhancing).
    pub generation_time: f64,
    /// `None` when the store could not be written; see `save_error`.
    pub saved: Option<SaveSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}
