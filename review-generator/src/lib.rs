//! Product review generation.
//!
//! - [`pipeline::GenerationPipeline`] turns a `(user, product)` pair into
//!   exactly one [`Review`]: up to `max_retries` primary attempts, then the
//!   reduced-context, template and hard-fallback tiers.
//! - [`batch`] runs several pipelines concurrently with per-item outcomes.
//! - [`enhancer::ReviewEnhancer`] enriches finished reviews.
//! - [`category`] is the static per-category registry used by the prompts.

pub mod batch;
pub mod category;
pub mod config;
pub mod enhancer;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BatchReport, ItemStatus};
pub use category::{Category, CategoryProfile};
pub use config::GenerationConfig;
pub use enhancer::ReviewEnhancer;
pub use errors::{AttemptError, GenError, GenResult, TierError};
pub use model::{ProductInfo, Review, ReviewOrigin, ReviewRequest, UserBackground};
pub use pipeline::parse::cleanup_json_like;
pub use pipeline::{AttemptRecord, FallbackTier, GenerationOutcome, GenerationPipeline, call_model};
pub use prompt::{CategoryPromptProvider, PromptProvider};
