//! Single-review generation: primary attempts, then the fallback chain.
//!
//! ```text
//! PRIMARY_ATTEMPT[0..max_retries] --ok--> Review(origin=primary)
//!        | exhausted
//!        v
//! reduced_context --> template --> hard_fallback --ok--> Review(origin=tier)
//!        | all failed
//!        v
//! GenError::AllStrategiesFailed
//! ```
//!
//! Attempts are strictly ordered with a fixed backoff between them. Every
//! model call is bounded by `call_timeout`.

mod fallback;
pub(crate) mod parse;
mod primary;

use std::{sync::Arc, time::Duration};

use ai_llm_service::{CompletionParams, ModelClient};
use tracing::{error, info, instrument, warn};

use crate::{
    config::GenerationConfig,
    errors::{AttemptError, GenError, GenResult, TierError},
    model::{ProductInfo, Review, ReviewOrigin, UserBackground},
    prompt::PromptProvider,
};

pub use fallback::FallbackTier;

/// One primary round-trip, kept for inspection. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// Zero-based attempt index.
    pub index: u32,
    /// Raw model text, when the call returned any.
    pub raw_response: Option<String>,
    /// `Ok(())` for the attempt that produced the review.
    pub outcome: Result<(), AttemptError>,
}

/// A review together with the trail that produced it.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub review: Review,
    pub attempts: Vec<AttemptRecord>,
    /// Tiers that were tried and failed before the one that succeeded.
    pub tier_failures: Vec<(FallbackTier, TierError)>,
}

impl GenerationOutcome {
    /// The fallback tier that produced the review, if the primary path failed.
    pub fn fallback_tier(&self) -> Option<FallbackTier> {
        FallbackTier::from_origin(self.review.origin)
    }
}

/// Drives one `(user, product)` pair to a finished [`Review`].
///
/// Cheap to share: all fields are `Arc`s or small config values.
#[derive(Clone)]
pub struct GenerationPipeline {
    client: Arc<dyn ModelClient>,
    prompts: Arc<dyn PromptProvider>,
    cfg: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(
        client: Arc<dyn ModelClient>,
        prompts: Arc<dyn PromptProvider>,
        cfg: GenerationConfig,
    ) -> Self {
        Self {
            client,
            prompts,
            cfg,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.cfg
    }

    /// Generates one review.
    ///
    /// # Errors
    /// - [`GenError::UnsupportedCategory`] for unknown category keys
    /// - [`GenError::AllStrategiesFailed`] if every tier failed
    pub async fn generate(&self, user: &UserBackground, product: &ProductInfo) -> GenResult<Review> {
        self.generate_with_trace(user, product)
            .await
            .map(|o| o.review)
    }

    /// Same as [`generate`](Self::generate), but also returns the attempt
    /// trail and the tier failures.
    #[instrument(skip_all, fields(product = %product.name, category = %product.category))]
    pub async fn generate_with_trace(
        &self,
        user: &UserBackground,
        product: &ProductInfo,
    ) -> GenResult<GenerationOutcome> {
        let category = product.category()?;

        let missing = category.profile().missing_fields(product);
        if !missing.is_empty() {
            let names = missing.iter().map(|f| f.name()).collect::<Vec<_>>();
            warn!(
                category = %category,
                missing = ?names,
                "product lacks recommended fields for its category"
            );
        }

        let mut attempts = Vec::with_capacity(self.cfg.max_retries as usize);
        if let Some(review) = self.run_primary(user, product, &mut attempts).await {
            info!(attempts = attempts.len(), "review generated on primary path");
            return Ok(GenerationOutcome {
                review,
                attempts,
                tier_failures: Vec::new(),
            });
        }

        warn!(
            attempts = attempts.len(),
            "primary attempts exhausted; entering fallback chain"
        );

        let mut tier_failures = Vec::new();
        for tier in FallbackTier::CHAIN {
            match self.run_tier(tier, user, product).await {
                Ok(review) => {
                    info!(tier = ?tier, "review generated by fallback tier");
                    return Ok(GenerationOutcome {
                        review,
                        attempts,
                        tier_failures,
                    });
                }
                Err(e) => {
                    warn!(tier = ?tier, error = %e, "fallback tier failed");
                    tier_failures.push((tier, e));
                }
            }
        }

        error!(
            failures = ?tier_failures,
            "every generation strategy failed, including the hard fallback"
        );
        Err(GenError::AllStrategiesFailed {
            product: product.name.clone(),
        })
    }

    async fn call(&self, system: &str, user: &str, params: CompletionParams) -> Result<String, AttemptError> {
        call_model(self.client.as_ref(), system, user, params, self.cfg.call_timeout).await
    }
}

/// One bounded model round-trip. Client errors and elapsed timeouts both
/// become [`AttemptError`]s.
pub async fn call_model(
    client: &dyn ModelClient,
    system: &str,
    user: &str,
    params: CompletionParams,
    timeout: Duration,
) -> Result<String, AttemptError> {
    match tokio::time::timeout(timeout, client.complete(system, user, params)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AttemptError::from(e)),
        Err(_) => Err(AttemptError::Timeout(timeout)),
    }
}

/// Builds a first-version review from parsed fields.
fn assemble(
    user: &UserBackground,
    product: &ProductInfo,
    parsed: parse::ParsedReview,
    scores: (f64, f64),
    origin: ReviewOrigin,
) -> Review {
    Review {
        user_background: user.clone(),
        product_info: product.clone(),
        rating: parsed.rating,
        content: parsed.content,
        sentiment: parsed.sentiment,
        experience: parsed.experience,
        pros: parsed.pros,
        cons: parsed.cons,
        sentiment_score: scores.0,
        quality_score: scores.1,
        origin,
        version: 1,
    }
}
