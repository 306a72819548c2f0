//! Quality scoring for generated reviews.
//!
//! [`QualityScorer::check_quality`] scores a review on authenticity,
//! consistency, specificity and language naturalness (1 to 5 each), averages
//! them into `overall_score` and attaches a short analysis.

pub mod dimension;
pub mod errors;
pub mod prompt;
pub mod report;
pub mod scorer;

pub use dimension::Dimension;
pub use errors::{ScoreError, ScoreResult};
pub use report::{DimensionScore, ScoreReport};
pub use scorer::{QualityScorer, ScorerConfig};
