//! Model-client contract shared by generation, enhancement and scoring.
//!
//! Implement [`ModelClient`] to plug in any completion backend. The trait is
//! object-safe (boxed future) so callers can hold an `Arc<dyn ModelClient>`
//! and tests can substitute scripted clients.

use std::{future::Future, pin::Pin};

use crate::error_handler::AiLlmError;

/// Boxed future returned by [`ModelClient::complete`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Per-call sampling knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Ask the backend for a JSON object response (`response_format` / `format`).
    pub structured_output: bool,
}

impl CompletionParams {
    pub fn json(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            structured_output: true,
        }
    }

    pub fn text(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            structured_output: false,
        }
    }
}

/// Sends a `(system, user, params)` tuple to a completion service.
///
/// A nominally successful call can still return malformed or empty text;
/// callers must validate the content.
pub trait ModelClient: Send + Sync {
    /// Runs one non-streaming completion and returns the raw assistant text.
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> CompletionFuture<'a>;

    /// Like [`complete`](Self::complete), but lets the backend consult its
    /// web-search tool before answering. `None` when the backend has none.
    fn search_complete<'a>(
        &'a self,
        _system: &'a str,
        _user: &'a str,
        _params: CompletionParams,
    ) -> Option<CompletionFuture<'a>> {
        None
    }

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}
