//! Shared LLM service with two profiles: `primary` and `enhancement`.
//!
//! - Construct once, wrap in `Arc`, and hand out `Arc<dyn ModelClient>`
//!   clones to the pipeline, the enhancer and the scorer.
//! - If the `enhancement` profile is not provided (or equals `primary`), both
//!   roles share one client.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::{CompletionParams, LlmModelConfig, LlmProvider, LlmServiceProfiles};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(2000),
//!     temperature: Some(0.7),
//!     top_p: Some(0.9),
//!     timeout_secs: Some(60),
//!     web_search: false,
//! };
//!
//! let svc = LlmServiceProfiles::new(primary, None, Some(10))?;
//! let txt = svc
//!     .primary()
//!     .complete("", "你好", CompletionParams::text(0.7, 64))
//!     .await?;
//! println!("{txt}");
//! println!("{:?}", svc.health_all().await);
//! # Ok(()) }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{default_config, llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    model_client::{CompletionFuture, CompletionParams, ModelClient},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Provider-dispatching client built from a [`LlmModelConfig`].
#[derive(Debug)]
pub enum LlmClient {
    OpenAi(OpenAiService),
    Ollama(OllamaService),
}

impl LlmClient {
    /// Builds the concrete client matching `cfg.provider`.
    pub fn from_config(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::OpenAI => LlmClient::OpenAi(OpenAiService::new(cfg)?),
            LlmProvider::Ollama => LlmClient::Ollama(OllamaService::new(cfg)?),
        })
    }
}

impl ModelClient for LlmClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> CompletionFuture<'a> {
        match self {
            LlmClient::OpenAi(c) => c.complete(system, user, params),
            LlmClient::Ollama(c) => c.complete(system, user, params),
        }
    }

    fn search_complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> Option<CompletionFuture<'a>> {
        match self {
            LlmClient::OpenAi(c) => c.search_complete(system, user, params),
            LlmClient::Ollama(_) => None,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            LlmClient::OpenAi(c) => c.model_name(),
            LlmClient::Ollama(c) => c.model_name(),
        }
    }
}

/// Owns the `primary` and `enhancement` clients plus a health checker.
pub struct LlmServiceProfiles {
    primary_cfg: LlmModelConfig,
    enhancement_cfg: LlmModelConfig,

    primary: Arc<LlmClient>,
    enhancement: Arc<LlmClient>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates the service.
    ///
    /// - `primary`: required generation/scoring profile.
    /// - `enhancement_opt`: optional enhancement profile; falls back to `primary`.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if a client cannot be constructed.
    pub fn new(
        primary: LlmModelConfig,
        enhancement_opt: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let enhancement_cfg = enhancement_opt.unwrap_or_else(|| primary.clone());

        let primary_client = Arc::new(LlmClient::from_config(primary.clone())?);
        let enhancement_client = if enhancement_cfg == primary {
            Arc::clone(&primary_client)
        } else {
            Arc::new(LlmClient::from_config(enhancement_cfg.clone())?)
        };

        info!(
            primary_provider = %primary.provider,
            primary_model = %primary.model,
            enhancement_model = %enhancement_cfg.model,
            shared = Arc::ptr_eq(&primary_client, &enhancement_client),
            "LLM profiles initialized"
        );

        Ok(Self {
            primary_cfg: primary,
            enhancement_cfg,
            primary: primary_client,
            enhancement: enhancement_client,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles from the environment (see [`default_config`]).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let primary = default_config::primary_from_env()?;
        let enhancement = default_config::enhancement_from_env()?;
        Self::new(primary, enhancement, Some(10))
    }

    /// Client used for generation and scoring.
    pub fn primary(&self) -> Arc<dyn ModelClient> {
        self.primary.clone()
    }

    /// Client used for review enhancement.
    pub fn enhancement(&self) -> Arc<dyn ModelClient> {
        self.enhancement.clone()
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.primary_cfg.clone()];
        if self.enhancement_cfg != self.primary_cfg {
            list.push(self.enhancement_cfg.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(primary, enhancement)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.primary_cfg, &self.enhancement_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: Some(2000),
            temperature: Some(0.7),
            top_p: None,
            timeout_secs: Some(5),
            web_search: false,
        }
    }

    #[test]
    fn enhancement_falls_back_to_primary_client() {
        let svc = LlmServiceProfiles::new(ollama("qwen3:14b"), None, Some(1)).unwrap();
        assert!(Arc::ptr_eq(&svc.primary, &svc.enhancement));
        assert_eq!(svc.enhancement().model_name(), "qwen3:14b");
    }

    #[test]
    fn distinct_enhancement_gets_its_own_client() {
        let svc =
            LlmServiceProfiles::new(ollama("qwen3:14b"), Some(ollama("qwen3:32b")), Some(1))
                .unwrap();
        assert!(!Arc::ptr_eq(&svc.primary, &svc.enhancement));
        assert_eq!(svc.primary().model_name(), "qwen3:14b");
        assert_eq!(svc.enhancement().model_name(), "qwen3:32b");
    }
}
