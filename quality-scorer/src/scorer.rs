//! Four-dimension quality scoring.
//!
//! Each dimension is one model call running on its own task in a `JoinSet`;
//! all four are joined before the overall score is computed. Dropping the
//! check aborts whatever is still in flight. A dimension that cannot
//! be scored gets the minimum score and a synthetic reason, so a report is
//! always complete.

use std::{sync::Arc, time::Duration};

use ai_llm_service::{
    CompletionParams, ModelClient,
    error_handler::{env_opt_u64, env_opt_usize},
};
use futures::{StreamExt, stream};
use review_generator::{Review, call_model, cleanup_json_like};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::{
    dimension::Dimension,
    errors::ScoreResult,
    prompt::{ANALYSIS_SYSTEM_PROMPT, SCORING_SYSTEM_PROMPT, analysis_prompt, dimension_prompt},
    report::{ANALYSIS_PLACEHOLDER, DimensionScore, MISSING_REASON, ScoreReport, mean},
};

const SCORING_TEMPERATURE: f32 = 0.1;
const SCORING_MAX_TOKENS: u32 = 500;
const ANALYSIS_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    /// Per-call timeout for dimension and analysis calls.
    pub call_timeout: Duration,
    /// Reviews scored at once by [`QualityScorer::check_quality_batch`].
    pub batch_concurrency: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            batch_concurrency: 4,
        }
    }
}

impl ScorerConfig {
    /// Reads `LLM_CALL_TIMEOUT_SECS` and `BATCH_CONCURRENCY`.
    pub fn from_env() -> ai_llm_service::Result<Self> {
        let d = Self::default();
        Ok(Self {
            call_timeout: env_opt_u64("LLM_CALL_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.call_timeout),
            batch_concurrency: env_opt_usize("BATCH_CONCURRENCY")?
                .unwrap_or(d.batch_concurrency)
                .max(1),
        })
    }
}

#[derive(Clone)]
pub struct QualityScorer {
    client: Arc<dyn ModelClient>,
    cfg: ScorerConfig,
}

impl QualityScorer {
    pub fn new(client: Arc<dyn ModelClient>, cfg: ScorerConfig) -> Self {
        Self { client, cfg }
    }

    /// Scores one review on all four dimensions and asks for an analysis.
    ///
    /// Model failures never surface here; only a panicked or cancelled
    /// dimension task does.
    #[instrument(skip_all, fields(product = %review.product_info.name))]
    pub async fn check_quality(&self, review: &Review) -> ScoreResult<ScoreReport> {
        let mut set = JoinSet::new();
        for dimension in Dimension::ALL {
            let client = Arc::clone(&self.client);
            let prompt = dimension_prompt(dimension, review);
            let timeout = self.cfg.call_timeout;
            set.spawn(async move {
                let score = score_dimension(client.as_ref(), dimension, &prompt, timeout).await;
                (dimension, score)
            });
        }

        let mut report = ScoreReport::pending();
        while let Some(joined) = set.join_next().await {
            let (dimension, score) = joined?;
            *report.get_mut(dimension) = score;
        }
        report.overall_score = mean(&report.scores().map(|(_, s)| s));
        report.analysis = self.analyse(&review.content, &report.scores()).await;

        info!(overall = report.overall_score, "quality check finished");
        Ok(report)
    }

    /// Scores every review independently; results keep input order.
    #[instrument(skip_all, fields(count = reviews.len()))]
    pub async fn check_quality_batch(&self, reviews: &[Review]) -> Vec<ScoreResult<ScoreReport>> {
        let mut out: Vec<(usize, ScoreResult<ScoreReport>)> =
            stream::iter(reviews.iter().cloned().enumerate())
                .map(|(i, review)| {
                    let this = self.clone();
                    async move { (i, this.check_quality(&review).await) }
                })
                .buffer_unordered(self.cfg.batch_concurrency.max(1))
                .collect()
                .await;
        out.sort_by_key(|(i, _)| *i);
        out.into_iter().map(|(_, r)| r).collect()
    }

    async fn analyse(&self, content: &str, scores: &[(Dimension, f64)]) -> Vec<String> {
        let prompt = analysis_prompt(content, scores);
        let params = CompletionParams::json(SCORING_TEMPERATURE, ANALYSIS_MAX_TOKENS);

        let parsed = call_model(
            self.client.as_ref(),
            ANALYSIS_SYSTEM_PROMPT,
            &prompt,
            params,
            self.cfg.call_timeout,
        )
        .await
        .map_err(|e| e.to_string())
        .and_then(|raw| parse_analysis(&raw));

        match parsed {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "quality analysis unavailable");
                vec![ANALYSIS_PLACEHOLDER.to_string()]
            }
        }
    }
}

async fn score_dimension(
    client: &dyn ModelClient,
    dimension: Dimension,
    prompt: &str,
    timeout: Duration,
) -> DimensionScore {
    let params = CompletionParams::json(SCORING_TEMPERATURE, SCORING_MAX_TOKENS);
    let result = call_model(client, SCORING_SYSTEM_PROMPT, prompt, params, timeout)
        .await
        .map_err(|e| e.to_string())
        .and_then(|raw| parse_dimension(&raw));

    match result {
        Ok(score) => {
            debug!(%dimension, score = score.score, "dimension scored");
            score
        }
        Err(e) => {
            warn!(%dimension, error = %e, "dimension check failed");
            DimensionScore::failed(dimension, e)
        }
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    let cleaned = cleanup_json_like(raw);
    if cleaned.is_empty() {
        return Err("empty response".into());
    }
    serde_json::from_str(&cleaned).map_err(|e| format!("invalid JSON: {e}"))
}

/// `{"score": number | numeric string, "reason": string}`; the score is clamped
/// and a missing or blank reason becomes [`MISSING_REASON`].
fn parse_dimension(raw: &str) -> Result<DimensionScore, String> {
    let v = parse_json(raw)?;
    let score = match v.get("score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .ok_or_else(|| "missing or non-numeric score".to_string())?;

    let reason = v
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(MISSING_REASON);
    Ok(DimensionScore::clamped(score, reason))
}

/// `{"analysis": [string, ...]}`; an empty list counts as a failure.
fn parse_analysis(raw: &str) -> Result<Vec<String>, String> {
    let v = parse_json(raw)?;
    let lines: Vec<String> = v
        .get("analysis")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing analysis list".to_string())?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        return Err("empty analysis list".into());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Instant,
    };

    use ai_llm_service::{
        AiLlmError, CompletionFuture,
        error_handler::{Provider, ProviderError, ProviderErrorKind},
    };
    use review_generator::{ProductInfo, ReviewOrigin, UserBackground};

    use super::*;

    /// Answers by looking at which dimension the prompt asks about.
    struct RoutedClient {
        delay: Duration,
        calls: AtomicUsize,
        completed: AtomicUsize,
        route: fn(&str) -> Option<String>,
    }

    impl RoutedClient {
        fn new(route: fn(&str) -> Option<String>) -> Self {
            Self {
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                route,
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl ModelClient for RoutedClient {
        fn complete<'a>(
            &'a self,
            _system: &'a str,
            user: &'a str,
            _params: CompletionParams,
        ) -> CompletionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.completed.fetch_add(1, Ordering::SeqCst);
                (self.route)(user).ok_or_else(|| {
                    AiLlmError::from(ProviderError::new(
                        Provider::OpenAI,
                        ProviderErrorKind::EmptyChoices,
                    ))
                })
            })
        }

        fn model_name(&self) -> &str {
            "routed"
        }
    }

    fn review() -> Review {
        Review {
            user_background: UserBackground {
                occupation: Some("软件开发工程师".into()),
                age: Some(32),
                ..Default::default()
            },
            product_info: ProductInfo {
                name: "ProBook X5".into(),
                category: "electronics".into(),
                ..Default::default()
            },
            rating: 4.0,
            content: "编译速度很快，续航够一天。".into(),
            sentiment: "积极".into(),
            experience: String::new(),
            pros: vec![],
            cons: vec![],
            sentiment_score: 0.9,
            quality_score: 0.9,
            origin: ReviewOrigin::Primary,
            version: 1,
        }
    }

    fn scorer(client: RoutedClient) -> QualityScorer {
        let cfg = ScorerConfig {
            call_timeout: Duration::from_secs(2),
            ..ScorerConfig::default()
        };
        QualityScorer::new(Arc::new(client), cfg)
    }

    #[tokio::test]
    async fn every_failure_yields_minimum_scores_with_reasons() {
        let report = scorer(RoutedClient::new(|_| None))
            .check_quality(&review())
            .await
            .unwrap();

        for (d, score) in report.scores() {
            assert_eq!(score, 1.0, "{d}");
            assert!(!report.get(d).reason.is_empty());
        }
        assert_eq!(report.overall_score, 1.0);
        assert_eq!(report.analysis, vec![ANALYSIS_PLACEHOLDER.to_string()]);
    }

    #[tokio::test]
    async fn scores_are_clamped_and_averaged() {
        let client = RoutedClient::new(|prompt| {
            let body = if prompt.contains("质量分析") {
                r#"{"analysis":["真实可信","细节充分"]}"#
            } else if prompt.contains("的真实性") {
                r#"{"score": 7, "reason": "很真实"}"#
            } else if prompt.contains("的一致性") {
                r#"{"score": -2, "reason": "矛盾"}"#
            } else if prompt.contains("的具体性") {
                r#"```json
{"score": "4", "reason": "具体"}
```"#
            } else {
                r#"{"score": 3.0}"#
            };
            Some(body.to_string())
        });
        let report = scorer(client).check_quality(&review()).await.unwrap();

        assert_eq!(report.authenticity.score, 5.0);
        assert_eq!(report.consistency.score, 1.0);
        assert_eq!(report.specificity.score, 4.0);
        assert_eq!(report.naturalness.score, 3.0);
        assert_eq!(report.naturalness.reason, MISSING_REASON);
        assert_eq!(report.overall_score, (5.0 + 1.0 + 4.0 + 3.0) / 4.0);
        assert_eq!(report.analysis.len(), 2);
    }

    #[tokio::test]
    async fn non_numeric_score_counts_as_failure() {
        let client = RoutedClient::new(|prompt| {
            if prompt.contains("的真实性") {
                Some(r#"{"score": "high", "reason": "x"}"#.into())
            } else {
                Some(r#"{"score": 4, "reason": "ok", "analysis": ["ok"]}"#.into())
            }
        });
        let report = scorer(client).check_quality(&review()).await.unwrap();
        assert_eq!(report.authenticity.score, 1.0);
        assert!(report.authenticity.reason.contains("真实性"));
        assert_eq!(report.naturalness.score, 4.0);
    }

    #[tokio::test]
    async fn dimensions_run_concurrently() {
        let client = RoutedClient::new(|_| Some(r#"{"score": 4, "reason": "ok"}"#.into()))
            .delayed(Duration::from_millis(150));
        let s = scorer(client);

        let started = Instant::now();
        s.check_quality(&review()).await.unwrap();
        // Four 150ms dimension calls in parallel plus one analysis call.
        assert!(started.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn timed_out_dimension_gets_minimum_score() {
        let client = RoutedClient::new(|_| Some(r#"{"score": 5, "reason": "ok"}"#.into()))
            .delayed(Duration::from_millis(200));
        let cfg = ScorerConfig {
            call_timeout: Duration::from_millis(20),
            ..ScorerConfig::default()
        };
        let report = QualityScorer::new(Arc::new(client), cfg)
            .check_quality(&review())
            .await
            .unwrap();
        assert_eq!(report.overall_score, 1.0);
    }

    #[tokio::test]
    async fn batch_keeps_input_order() {
        let client = RoutedClient::new(|prompt| {
            let score = if prompt.contains("第二条") { 2 } else { 5 };
            Some(format!(r#"{{"score": {score}, "reason": "r"}}"#))
        });
        let mut second = review();
        second.content = "第二条评价".into();

        let results = scorer(client)
            .check_quality_batch(&[review(), second])
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().overall_score, 5.0);
        assert_eq!(results[1].as_ref().unwrap().overall_score, 2.0);
    }

    #[tokio::test]
    async fn dropping_the_check_aborts_dimension_calls() {
        let client = Arc::new(
            RoutedClient::new(|_| Some(r#"{"score": 4, "reason": "ok"}"#.into()))
                .delayed(Duration::from_millis(200)),
        );
        let s = QualityScorer::new(client.clone(), ScorerConfig::default());

        let outcome = tokio::time::timeout(Duration::from_millis(50), s.check_quality(&review())).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
        assert_eq!(client.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_future_can_run_on_a_spawned_task() {
        let s = scorer(RoutedClient::new(|_| Some(r#"{"score": 3, "reason": "ok"}"#.into())));
        let reviews = vec![review(), review(), review()];

        let results = tokio::spawn(async move { s.check_quality_batch(&reviews).await })
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.as_ref().unwrap().overall_score == 3.0));
    }
}
