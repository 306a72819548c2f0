//! Scripted [`ModelClient`] for unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use ai_llm_service::{
    AiLlmError, CompletionFuture, CompletionParams, ModelClient,
    error_handler::{Provider, ProviderError, ProviderErrorKind},
};

use crate::model::{ProductInfo, UserBackground};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail,
    /// Never completes; exercises the per-call timeout.
    Hang,
}

/// Pops one reply per call; once the script is empty every call fails.
///
/// Web search is offered only after [`with_search`](Self::with_search).
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    searches: Option<Mutex<VecDeque<Reply>>>,
    calls: AtomicUsize,
    params: Mutex<Vec<CompletionParams>>,
    prompts: Mutex<Vec<(String, String)>>,
    started_at: Mutex<Vec<Instant>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            searches: None,
            calls: AtomicUsize::new(0),
            params: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            started_at: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search(mut self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.searches = Some(Mutex::new(replies.into_iter().collect()));
        self
    }

    pub fn failing() -> Self {
        Self::new([])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn params(&self) -> Vec<CompletionParams> {
        self.params.lock().unwrap().clone()
    }

    /// `(system, user)` of every call, searches included, in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }

    /// When each call was issued, in call order.
    pub fn call_times(&self) -> Vec<Instant> {
        self.started_at.lock().unwrap().clone()
    }

    fn record(&self, system: &str, user: &str, params: CompletionParams) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started_at.lock().unwrap().push(Instant::now());
        self.params.lock().unwrap().push(params);
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
    }
}

fn play(reply: Reply) -> CompletionFuture<'static> {
    Box::pin(async move {
        match reply {
            Reply::Text(t) => Ok(t),
            Reply::Fail => Err(AiLlmError::from(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::EmptyChoices,
            ))),
            Reply::Hang => std::future::pending().await,
        }
    })
}

impl ModelClient for ScriptedClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> CompletionFuture<'a> {
        self.record(system, user, params);
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Fail);
        play(reply)
    }

    fn search_complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        params: CompletionParams,
    ) -> Option<CompletionFuture<'a>> {
        let searches = self.searches.as_ref()?;
        self.record(system, user, params);
        let reply = searches.lock().unwrap().pop_front().unwrap_or(Reply::Fail);
        Some(play(reply))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn user() -> UserBackground {
    UserBackground {
        occupation: Some("软件开发工程师".into()),
        age: Some(32),
        ..Default::default()
    }
}

pub(crate) fn product() -> ProductInfo {
    ProductInfo {
        name: "ProBook X5".into(),
        category: "electronics".into(),
        features: vec!["轻薄机身".into(), "长续航".into(), "高分屏".into()],
        ..Default::default()
    }
}

pub(crate) fn primary_json(rating: f64) -> String {
    format!(
        r#"{{"content":"作为开发者，这台电脑编译速度快，续航也够一天。","rating":{rating},
            "sentiment":"积极","experience":"日常开发使用两周","pros":["续航长"],"cons":["接口少"],
            "sentiment_score":0.92,"quality_score":0.88}}"#
    )
}

pub(crate) fn reduced_json() -> String {
    r#"{"content":"整体不错，轻薄好带。","rating":4,"sentiment":"积极",
        "experience":"通勤携带","pros":["轻薄"],"cons":["价格偏高"]}"#
        .to_string()
}
