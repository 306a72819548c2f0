//! Shared LLM access layer.
//!
//! - [`model_client::ModelClient`] is the contract every caller codes against:
//!   `(system, user, params) -> text`. It may fail transiently and may return
//!   malformed or empty text even when the transport succeeded, so callers
//!   validate content themselves.
//! - [`services`] holds the concrete OpenAI-compatible and Ollama clients.
//! - [`service_profiles::LlmServiceProfiles`] owns the `primary` and
//!   `enhancement` clients built from env-driven configs.
//! - [`health_service`] probes providers for the `/health` endpoint.
//! - [`telemetry`] exposes a library-scoped `tracing` layer.

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod ollama_service;
    pub mod open_ai_service;
}

pub mod error_handler;
pub mod health_service;
pub mod model_client;
pub mod service_profiles;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use model_client::{CompletionFuture, CompletionParams, ModelClient};
pub use service_profiles::{LlmClient, LlmServiceProfiles};
