use ai_llm_service::CompletionParams;
use tracing::{debug, warn};

use super::{AttemptRecord, GenerationPipeline, assemble, parse};
use crate::{
    errors::AttemptError,
    model::{ProductInfo, Review, ReviewOrigin, UserBackground},
    prompt::REVIEW_SYSTEM_PROMPT,
};

impl GenerationPipeline {
    /// Runs up to `max_retries` primary attempts. Returns `None` once all of
    /// them failed; every attempt is appended to `records`.
    pub(super) async fn run_primary(
        &self,
        user: &UserBackground,
        product: &ProductInfo,
        records: &mut Vec<AttemptRecord>,
    ) -> Option<Review> {
        let prompt = self.prompts.build_prompt(user, product);
        let params = CompletionParams::json(self.cfg.temperature, self.cfg.max_tokens);

        for index in 0..self.cfg.max_retries {
            if index > 0 {
                tokio::time::sleep(self.cfg.retry_backoff).await;
            }

            let (raw_response, result) = match self.call(REVIEW_SYSTEM_PROMPT, &prompt, params).await {
                Ok(raw) => {
                    let parsed = parse::parse_primary(&raw);
                    (Some(raw), parsed)
                }
                Err(e) => (None, Err(e)),
            };

            match result {
                Ok(parsed) => {
                    debug!(attempt = index + 1, "primary attempt succeeded");
                    records.push(AttemptRecord {
                        index,
                        raw_response,
                        outcome: Ok(()),
                    });
                    let scores = parsed.scores.unwrap_or_default();
                    return Some(assemble(user, product, parsed, scores, ReviewOrigin::Primary));
                }
                Err(e) => {
                    log_attempt_failure(index, self.cfg.max_retries, &e);
                    records.push(AttemptRecord {
                        index,
                        raw_response,
                        outcome: Err(e),
                    });
                }
            }
        }
        None
    }
}

fn log_attempt_failure(index: u32, max: u32, e: &AttemptError) {
    warn!(
        attempt = index + 1,
        max_attempts = max,
        error = %e,
        "primary attempt failed"
    );
}
