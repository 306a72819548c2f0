//! Model configs loaded strictly from environment variables.
//!
//! Two roles are supported:
//!
//! - **Primary**     → generation and quality scoring
//! - **Enhancement** → review enrichment; optional, falls back to primary
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`openai`, `deepseek`, `ollama`); default `openai`
//! - `LLM_MAX_TOKENS` = default token budget (u32, default 2000)
//! - `LLM_TEMPERATURE` = default temperature (f32, default 0.7)
//! - `LLM_TIMEOUT_SECS` = HTTP client timeout (u64, default 60)
//!
//! OpenAI-compatible:
//! - `OPENAI_API_BASE`, `OPENAI_API_KEY`, `OPENAI_API_MODEL` (all required)
//! - `ENHANCE_API_BASE`, `ENHANCE_API_KEY`, `ENHANCE_API_MODEL` (optional set)
//! - `ENHANCE_WEB_SEARCH` = enhancement endpoint serves `$web_search` (bool, default false)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_bool, env_opt_f32, env_opt_u32, env_opt_u64,
        must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Shared knobs read once per profile.
struct CommonKnobs {
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

fn common_knobs() -> Result<CommonKnobs, AiLlmError> {
    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("LLM_TEMPERATURE", temperature, 0.0, 2.0)?;

    Ok(CommonKnobs {
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature,
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
    })
}

/// Resolves the provider kind from `LLM_KIND` (default: OpenAI-compatible).
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match env_opt("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::OpenAI),
    }
}

/// Builds the primary profile according to `LLM_KIND`.
///
/// # Errors
/// Propagates missing/invalid variables as [`AiLlmError::Config`].
pub fn primary_from_env() -> Result<LlmModelConfig, AiLlmError> {
    match provider_from_env()? {
        LlmProvider::OpenAI => config_openai_primary(),
        LlmProvider::Ollama => config_ollama(),
    }
}

/// Builds the enhancement profile, or `Ok(None)` when no `ENHANCE_*` set is
/// configured.
///
/// A partial set (e.g. only `ENHANCE_API_KEY`) is a configuration error.
pub fn enhancement_from_env() -> Result<Option<LlmModelConfig>, AiLlmError> {
    let base = env_opt("ENHANCE_API_BASE");
    let key = env_opt("ENHANCE_API_KEY");
    let model = env_opt("ENHANCE_API_MODEL");

    match (base, key, model) {
        (None, None, None) => Ok(None),
        (Some(endpoint), Some(api_key), Some(model)) => {
            validate_http_endpoint("ENHANCE_API_BASE", &endpoint)?;
            let knobs = common_knobs()?;
            let mut cfg = openai_config(endpoint, api_key, model, &knobs);
            cfg.web_search = env_opt_bool("ENHANCE_WEB_SEARCH")?.unwrap_or(false);
            Ok(Some(cfg))
        }
        (None, _, _) => Err(ConfigError::MissingVar("ENHANCE_API_BASE").into()),
        (_, None, _) => Err(ConfigError::MissingVar("ENHANCE_API_KEY").into()),
        (_, _, None) => Err(ConfigError::MissingVar("ENHANCE_API_MODEL").into()),
    }
}

/// Constructs the OpenAI-compatible primary config.
///
/// # Env
/// - `OPENAI_API_BASE`, `OPENAI_API_KEY`, `OPENAI_API_MODEL` (required)
pub fn config_openai_primary() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = must_env("OPENAI_API_BASE")?;
    validate_http_endpoint("OPENAI_API_BASE", &endpoint)?;
    let api_key = must_env("OPENAI_API_KEY")?;
    let model = must_env("OPENAI_API_MODEL")?;
    let knobs = common_knobs()?;

    Ok(openai_config(endpoint, api_key, model, &knobs))
}

fn openai_config(
    endpoint: String,
    api_key: String,
    model: String,
    knobs: &CommonKnobs,
) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: Some(knobs.max_tokens),
        temperature: Some(knobs.temperature),
        top_p: None,
        timeout_secs: Some(knobs.timeout_secs),
        web_search: false,
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Constructs the Ollama config.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
///
/// # Defaults
/// - `top_p = Some(0.9)`
pub fn config_ollama() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;
    let knobs = common_knobs()?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: Some(knobs.max_tokens),
        temperature: Some(knobs.temperature),
        top_p: Some(0.9),
        timeout_secs: Some(knobs.timeout_secs),
        web_search: false,
    })
}
