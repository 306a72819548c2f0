//! Review enhancement with the `enhancement` model profile.
//!
//! 1. If the client offers web search, one search round collects product
//!    facts. A failed search is logged and enhancement proceeds without it.
//! 2. The merge call is retried with exponential backoff, starting at
//!    `retry_backoff` and capped at [`MAX_BACKOFF`].
//!
//! Enhancement never fails from the caller's point of view: on any error the
//! original review comes back unchanged.

use std::{sync::Arc, time::Duration};

use ai_llm_service::{CompletionParams, ModelClient};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::GenerationConfig,
    errors::AttemptError,
    model::{Review, ReviewOrigin},
    pipeline::{call_model, parse},
    prompt::{
        ENHANCE_SYSTEM_PROMPT, MERGE_SYSTEM_PROMPT, SEARCH_SYSTEM_PROMPT, enhancement_prompt,
        search_prompt,
    },
};

/// Quality bonus for a successfully enhanced review, capped at 1.0.
const QUALITY_BONUS: f64 = 0.1;

/// Sampling temperature for the search round.
const SEARCH_TEMPERATURE: f32 = 0.3;

/// Longest wait between two enhancement attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ReviewEnhancer {
    client: Arc<dyn ModelClient>,
    cfg: GenerationConfig,
}

impl ReviewEnhancer {
    pub fn new(client: Arc<dyn ModelClient>, cfg: GenerationConfig) -> Self {
        Self { client, cfg }
    }

    /// Returns an enhanced copy of `review`, or a clone of it on failure.
    pub async fn enhance(&self, review: &Review) -> Review {
        match self.try_enhance(review).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                warn!(
                    product = %review.product_info.name,
                    error = %e,
                    "review enhancement failed; keeping original"
                );
                review.clone()
            }
        }
    }

    /// Strict variant of [`enhance`](Self::enhance); returns the last
    /// attempt's error once every attempt failed.
    #[instrument(skip_all, fields(product = %review.product_info.name, version = review.version))]
    pub async fn try_enhance(&self, review: &Review) -> Result<Review, AttemptError> {
        let findings = self.search(review).await;
        let system = if findings.is_some() {
            MERGE_SYSTEM_PROMPT
        } else {
            ENHANCE_SYSTEM_PROMPT
        };
        let prompt = enhancement_prompt(review, findings.as_deref());

        let attempts = self.cfg.max_retries.max(1);
        let mut attempt = 1;
        loop {
            match self.enhance_once(review, system, &prompt).await {
                Ok(enhanced) => return Ok(enhanced),
                Err(e) if attempt < attempts => {
                    let delay = backoff(self.cfg.retry_backoff, attempt);
                    warn!(attempt, error = %e, delay_ms = delay.as_millis(), "enhancement attempt failed");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Enhances every review concurrently, preserving order.
    pub async fn enhance_all(&self, reviews: &[Review]) -> Vec<Review> {
        join_all(reviews.iter().map(|r| self.enhance(r))).await
    }

    /// Runs the web-search round when the client supports it.
    async fn search(&self, review: &Review) -> Option<String> {
        let query = search_prompt(review);
        let params = CompletionParams::text(SEARCH_TEMPERATURE, self.cfg.max_tokens);
        let call = self.client.search_complete(SEARCH_SYSTEM_PROMPT, &query, params)?;

        match tokio::time::timeout(self.cfg.call_timeout, call).await {
            Ok(Ok(found)) if !found.trim().is_empty() => {
                debug!(len = found.len(), "web search returned findings");
                Some(found)
            }
            Ok(Ok(_)) => {
                warn!("web search returned nothing; enhancing without it");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "web search failed; enhancing without it");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.cfg.call_timeout.as_millis(), "web search timed out");
                None
            }
        }
    }

    async fn enhance_once(
        &self,
        review: &Review,
        system: &str,
        prompt: &str,
    ) -> Result<Review, AttemptError> {
        let params = CompletionParams::json(self.cfg.temperature, self.cfg.max_tokens);
        let raw = call_model(
            self.client.as_ref(),
            system,
            prompt,
            params,
            self.cfg.call_timeout,
        )
        .await?;

        let obj = parse::parse_object(&raw)?;
        let content = parse::text(&obj, "enhanced_content")?;
        if content.is_empty() {
            return Err(AttemptError::EmptyContent);
        }
        let added_info = parse::text_list(&obj, "added_info")?;
        let confidence = parse::number_in(&obj, "confidence_score", 0.0, 1.0)?;
        let pros = parse::text_list(&obj, "pros")?;
        let cons = parse::text_list(&obj, "cons")?;

        info!(
            added = added_info.len(),
            confidence,
            "review enhanced"
        );

        Ok(Review {
            content,
            pros,
            cons,
            quality_score: (review.quality_score + QUALITY_BONUS).min(1.0),
            origin: ReviewOrigin::Enhanced,
            version: review.version + 1,
            ..review.clone()
        })
    }
}

/// `base * 2^(attempt - 1)`, capped at [`MAX_BACKOFF`].
fn backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}
