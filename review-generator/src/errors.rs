//! Error hierarchy for review-generator.
//!
//! - [`GenError`] is the only error a caller ever sees.
//! - [`AttemptError`] and [`TierError`] describe why a primary attempt or a
//!   fallback tier did not produce a review. They are recorded and logged,
//!   never raised on their own.

use std::time::Duration;

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GenResult<T> = Result<T, GenError>;

/// Root error type for the review-generator crate.
#[derive(Debug, Error)]
pub enum GenError {
    /// Request failed input validation (count, blank name, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// `product_info.category` is not one of the supported keys.
    #[error("unsupported category: {0}")]
    UnsupportedCategory(String),

    /// Every fallback tier failed, including the dependency-free one.
    #[error("all generation strategies failed for product `{product}`")]
    AllStrategiesFailed { product: String },
}

/// Why a single model round-trip did not yield a usable review.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    /// The model client returned an error (transport, HTTP status, decode).
    #[error("model call failed: {message}")]
    Model { message: String, transient: bool },

    /// The call did not finish within the per-call timeout.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The response (or its body field) was blank.
    #[error("empty response content")]
    EmptyContent,

    /// The response was not a JSON object.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A numeric field could not be coerced to a float.
    #[error("field `{field}` is not numeric: {raw}")]
    NotNumeric { field: &'static str, raw: String },

    /// A field has a JSON type that cannot be used (e.g. object for `content`).
    #[error("field `{0}` has an unexpected type")]
    WrongType(&'static str),

    /// A numeric field parsed, but falls outside its allowed range.
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

impl From<ai_llm_service::AiLlmError> for AttemptError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        AttemptError::Model {
            transient: e.is_transient(),
            message: e.to_string(),
        }
    }
}

/// Why a fallback tier did not yield a review.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierError {
    /// The tier's model round-trip failed.
    #[error(transparent)]
    Attempt(#[from] AttemptError),

    /// The template tier needs at least one product feature.
    #[error("product has no features to draw from")]
    NoFeatures,

    /// The hard fallback needs a product name to reference.
    #[error("product name is blank")]
    BlankProductName,
}
