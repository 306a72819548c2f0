use std::time::Duration;

use ai_llm_service::error_handler::{
    env_opt_f32, env_opt_u32, env_opt_u64, env_opt_usize, validate_range_f32,
};

/// Knobs for the generation pipeline and the enhancer.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature for generation calls.
    pub temperature: f32,
    /// Token budget for generation calls.
    pub max_tokens: u32,
    /// Number of primary attempts before the fallback chain.
    pub max_retries: u32,
    /// Fixed delay between primary attempts.
    pub retry_backoff: Duration,
    /// Per-call timeout; an elapsed timeout counts as a failed attempt.
    pub call_timeout: Duration,
    /// Upper bound on concurrently running pipelines in a batch.
    pub batch_concurrency: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            max_retries: 3,
            retry_backoff: Duration::from_millis(1000),
            call_timeout: Duration::from_secs(60),
            batch_concurrency: 4,
        }
    }
}

impl GenerationConfig {
    /// Reads `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`, `MAX_RETRIES`,
    /// `RETRY_BACKOFF_MS`, `LLM_CALL_TIMEOUT_SECS` and `BATCH_CONCURRENCY`,
    /// falling back to [`GenerationConfig::default`] for unset values.
    pub fn from_env() -> ai_llm_service::Result<Self> {
        let d = Self::default();

        let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(d.temperature);
        validate_range_f32("LLM_TEMPERATURE", temperature, 0.0, 2.0)?;

        Ok(Self {
            temperature,
            max_tokens: env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(d.max_tokens),
            max_retries: env_opt_u32("MAX_RETRIES")?.unwrap_or(d.max_retries),
            retry_backoff: env_opt_u64("RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(d.retry_backoff),
            call_timeout: env_opt_u64("LLM_CALL_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.call_timeout),
            batch_concurrency: env_opt_usize("BATCH_CONCURRENCY")?
                .unwrap_or(d.batch_concurrency)
                .max(1),
        })
    }
}
