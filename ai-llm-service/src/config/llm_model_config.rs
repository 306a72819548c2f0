use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM endpoint/model pair.
///
/// Per-call knobs (temperature, token budget, JSON mode) travel with each
/// request through [`crate::CompletionParams`]; the values kept here are
/// connection-level defaults.
///
/// # Fields
///
/// - `provider`: Which backend to talk to.
/// - `model`: The model identifier (e.g., `"deepseek-chat"`, `"qwen3:14b"`).
/// - `endpoint`: Base URL of the inference server.
/// - `api_key`: Optional API key for providers that require authentication.
/// - `max_tokens`: Default token budget when a caller has no opinion.
/// - `temperature`: Default sampling temperature.
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: HTTP client timeout in seconds.
/// - `web_search`: Whether enhancement may run a web-search tool round first.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "deepseek-chat".to_string(),
///     endpoint: "https://api.deepseek.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(2000),
///     temperature: Some(0.7),
///     top_p: Some(0.9),
///     timeout_secs: Some(60),
///     web_search: false,
/// };
/// assert_eq!(cfg.model, "deepseek-chat");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (base URL).
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Default maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Default sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// The endpoint serves the builtin `$web_search` tool (Moonshot-style).
    pub web_search: bool,
}
