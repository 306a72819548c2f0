//! OpenAI-compatible chat-completions client.
//!
//! Minimal, non-streaming client around the OpenAI REST API, usable with any
//! compatible vendor (DeepSeek, Moonshot, ...). The chat URL is derived from
//! `LlmModelConfig::endpoint`:
//! - `{endpoint}/chat/completions` when the endpoint already ends in `/v1`
//! - `{endpoint}/v1/chat/completions` otherwise
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    model_client::{CompletionFuture, CompletionParams, ModelClient},
};

/// Upper bound on `tool_calls` round-trips in [`OpenAiService::search_chat`].
pub const MAX_TOOL_ROUNDS: usize = 4;

/// Thin client for an OpenAI-compatible API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = chat_url(endpoint);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// Messages: system (if non-empty) then user. `params` override the
    /// config's temperature/token defaults; `structured_output` maps to
    /// `response_format: {"type": "json_object"}`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no content is returned
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::new(&self.cfg, system, user, params);

        debug!(
            model = %self.cfg.model,
            prompt_len = user.len(),
            json_mode = params.structured_output,
            "POST {}", self.url_chat
        );

        let out: ChatCompletionResponse = self.post(&body, started).await?;
        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            content_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Chat completion with the builtin `$web_search` tool enabled.
    ///
    /// While the model answers with `finish_reason = "tool_calls"`, the
    /// assistant turn and one `tool` message per call (echoing the call's
    /// arguments) are appended and the request is resent. The search itself
    /// runs server-side. Gives up after [`MAX_TOOL_ROUNDS`] round-trips.
    pub async fn search_chat(
        &self,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let mut messages = Vec::with_capacity(2 + 2 * MAX_TOOL_ROUNDS);
        if !system.is_empty() {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": user }));

        for round in 0..MAX_TOOL_ROUNDS {
            let body = SearchRequest {
                model: &self.cfg.model,
                messages: &messages,
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                tools: [BuiltinTool::web_search()],
            };
            debug!(model = %self.cfg.model, round, "POST {} (web search)", self.url_chat);

            let out: SearchResponse = self.post(&body, started).await?;
            let choice = out.choices.into_iter().next().ok_or_else(|| {
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices)
            })?;

            if choice.finish_reason.as_deref() != Some("tool_calls") {
                let content = choice
                    .message
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| {
                        ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices)
                    })?;
                info!(
                    model = %self.cfg.model,
                    rounds = round,
                    latency_ms = started.elapsed().as_millis(),
                    content_len = content.len(),
                    "web search completion completed"
                );
                return Ok(content);
            }

            append_tool_round(&mut messages, choice.message)?;
        }

        Err(ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::Decode(format!(
                "tool calls did not settle after {MAX_TOOL_ROUNDS} rounds"
            )),
        )
        .into())
    }

    /// POSTs `body` to the chat URL and decodes a 2xx response as `R`.
    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        body: &B,
        started: Instant,
    ) -> Result<R, AiLlmError> {
        let resp = self.client.post(&self.url_chat).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<R>().await.map_err(|e| {
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode chat/completions response"
            );
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `choices[0].message`")),
            )
            .into()
        })
    }
}

/// Appends the assistant's tool-call turn and one `tool` reply per call.
fn append_tool_round(messages: &mut Vec<Value>, message: AssistantMessage) -> Result<(), AiLlmError> {
    let calls = message.tool_calls.clone().unwrap_or_default();
    let turn = serde_json::to_value(&message).map_err(|e| {
        ProviderError::new(Provider::OpenAI, ProviderErrorKind::Decode(e.to_string()))
    })?;
    messages.push(turn);

    for call in calls {
        debug!(tool = %call.function.name, id = %call.id, "returning tool call arguments");
        messages.push(json!({
            "role": "tool",
            "tool_call_id": call.id,
            "name": call.function.name,
            "content": call.function.arguments,
        }));
    }
    Ok(())
}

impl ModelClient for OpenAiService {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> CompletionFuture<'a> {
        Box::pin(self.chat(system, user, params))
    }

    fn search_complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> Option<CompletionFuture<'a>> {
        if !self.cfg.web_search {
            return None;
        }
        Some(Box::pin(self.search_chat(system, user, params)))
    }

    fn model_name(&self) -> &str {
        &self.cfg.model
    }
}

fn chat_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Minimal request body for `chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(cfg: &'a LlmModelConfig, system: &'a str, user: &'a str, params: CompletionParams) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: params.temperature,
            top_p: cfg.top_p,
            max_tokens: params.max_tokens,
            response_format: params.structured_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Minimal response for `chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for the web-search variant; messages are built dynamically.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    temperature: f32,
    max_tokens: u32,
    tools: [BuiltinTool; 1],
}

#[derive(Debug, Serialize)]
struct BuiltinTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: BuiltinFunction,
}

#[derive(Debug, Serialize)]
struct BuiltinFunction {
    name: &'static str,
}

impl BuiltinTool {
    fn web_search() -> Self {
        Self {
            kind: "builtin_function",
            function: BuiltinFunction {
                name: "$web_search",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    choices: Vec<SearchChoice>,
}

#[derive(Debug, Deserialize)]
struct SearchChoice {
    #[serde(default)]
    finish_reason: Option<String>,
    message: AssistantMessage,
}

/// Assistant turn; sent back verbatim when it carries tool calls.
#[derive(Debug, Serialize, Deserialize)]
struct AssistantMessage {
    #[serde(default = "assistant_role")]
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
}

fn assistant_role() -> String {
    "assistant".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: ToolFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}
