//! End-to-end tests over a real listener with canned model replies.

use std::{sync::Arc, time::Duration};

use ai_llm_service::{
    CompletionFuture, CompletionParams, ModelClient, health_service::HealthStatus,
};
use quality_scorer::{
    QualityScorer, ScorerConfig,
    prompt::{ANALYSIS_SYSTEM_PROMPT, SCORING_SYSTEM_PROMPT},
};
use review_generator::{
    CategoryPromptProvider, GenerationConfig, GenerationPipeline, ReviewEnhancer,
    prompt::{ENHANCE_SYSTEM_PROMPT, REVIEW_SYSTEM_PROMPT},
};
use review_store::{ReviewStore, TaskConfig, TaskStore};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{AppState, core::app_state::HealthProbe, router};

/// Answers by system prompt: a review, an enhancement, a score or an analysis.
struct CannedClient;

impl ModelClient for CannedClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        _user: &'a str,
        _params: CompletionParams,
    ) -> CompletionFuture<'a> {
        let reply = match system {
            REVIEW_SYSTEM_PROMPT => json!({
                "content": "作为开发者，编译速度快，续航够一天。",
                "rating": 4,
                "sentiment": "积极",
                "experience": "日常开发两周",
                "pros": ["续航长"],
                "cons": ["接口少"],
                "sentiment_score": 0.9,
                "quality_score": 0.85
            }),
            ENHANCE_SYSTEM_PROMPT => json!({
                "enhanced_content": "编译速度快，实测续航约12小时。",
                "added_info": ["续航实测"],
                "confidence_score": 0.8,
                "pros": ["续航长", "编译快"],
                "cons": ["接口少"]
            }),
            SCORING_SYSTEM_PROMPT => json!({"score": 4, "reason": "具体可信"}),
            ANALYSIS_SYSTEM_PROMPT => json!({"analysis": ["内容具体"]}),
            _ => json!({}),
        };
        Box::pin(async move { Ok(reply.to_string()) })
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

struct StaticHealth(bool);

impl HealthProbe for StaticHealth {
    fn probe(&self) -> std::pin::Pin<Box<dyn Future<Output = Vec<HealthStatus>> + Send + '_>> {
        let ok = self.0;
        Box::pin(async move {
            vec![HealthStatus {
                provider: "OpenAI".into(),
                endpoint: "http://127.0.0.1:9".into(),
                model: "canned".into(),
                ok,
                latency_ms: 1,
                message: if ok { "ok".into() } else { "unreachable".into() },
            }]
        })
    }
}

struct Harness {
    base: String,
    http: reqwest::Client,
    dir: TempDir,
}

async fn spawn_app(healthy: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let client: Arc<dyn ModelClient> = Arc::new(CannedClient);
    let gen_cfg = GenerationConfig {
        retry_backoff: Duration::from_millis(1),
        call_timeout: Duration::from_secs(2),
        ..GenerationConfig::default()
    };

    let state = AppState {
        pipeline: GenerationPipeline::new(
            Arc::clone(&client),
            Arc::new(CategoryPromptProvider),
            gen_cfg.clone(),
        ),
        enhancer: ReviewEnhancer::new(Arc::clone(&client), gen_cfg),
        scorer: QualityScorer::new(Arc::clone(&client), ScorerConfig::default()),
        reviews: Arc::new(ReviewStore::open(dir.path()).await.unwrap()),
        tasks: Arc::new(TaskStore::new(TaskConfig::default())),
        health: Arc::new(StaticHealth(healthy)),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    Harness {
        base: format!("http://{addr}"),
        http: reqwest::Client::new(),
        dir,
    }
}

impl Harness {
    async fn get(&self, path: &str) -> (u16, Value) {
        let res = self.http.get(format!("{}{path}", self.base)).send().await.unwrap();
        (res.status().as_u16(), res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let res = self
            .http
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .unwrap();
        (res.status().as_u16(), res.json().await.unwrap())
    }
}

fn request(num_reviews: u32) -> Value {
    json!({
        "user_background": {"occupation": "软件开发工程师", "age": 32},
        "product_info": {
            "name": "ProBook X5",
            "category": "electronics",
            "features": ["轻薄机身", "长续航"]
        },
        "num_reviews": num_reviews
    })
}

#[tokio::test]
async fn generated_reviews_are_returned_and_counted_in_stats() {
    let app = spawn_app(true).await;

    let (status, body) = app.post("/generate_reviews", &request(2)).await;
    assert_eq!(status, 200, "{body}");
    let reviews = body["data"]["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["rating"], 4.0);
    assert_eq!(reviews[0]["origin"], "primary");
    assert_eq!(body["data"]["outcomes"][0]["status"], "generated");
    assert_eq!(body["data"]["saved"]["written"], 2);
    assert!(body["data"].get("save_error").is_none());

    let (status, stats) = app.get("/review_stats/electronics").await;
    assert_eq!(status, 200);
    assert_eq!(stats["data"]["total_reviews"], 2);
    assert_eq!(stats["data"]["rating_distribution"]["4"], 2);
}

#[tokio::test]
async fn unwritable_store_still_returns_generated_reviews() {
    let app = spawn_app(true).await;
    std::fs::remove_dir_all(app.dir.path()).unwrap();

    let (status, body) = app.post("/generate_reviews", &request(2)).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["saved"], Value::Null);
    assert!(body["data"]["save_error"].as_str().unwrap().contains("I/O"));
}

#[tokio::test]
async fn enhanced_reviews_carry_a_new_version() {
    let app = spawn_app(true).await;
    let (status, body) = app.post("/enhance_reviews", &request(1)).await;
    assert_eq!(status, 200, "{body}");
    let review = &body["data"]["reviews"][0];
    assert_eq!(review["origin"], "enhanced");
    assert_eq!(review["version"], 2);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = spawn_app(true).await;

    let (status, body) = app.post("/generate_reviews", &request(11)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut unknown = request(1);
    unknown["product_info"]["category"] = json!("toys");
    let (status, body) = app.post("/generate_reviews", &unknown).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_CATEGORY");

    let mut malformed = request(1);
    malformed["product_info"]["features"] = json!("not a list");
    let (status, body) = app.post("/generate_reviews", &malformed).await;
    assert_eq!(status, 422);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
}

#[tokio::test]
async fn quality_result_is_delivered_once() {
    let app = spawn_app(true).await;
    let (_, generated) = app.post("/generate_reviews", &request(1)).await;
    let review = generated["data"]["reviews"][0].clone();

    let (status, accepted) = app.post("/check_quality", &review).await;
    assert_eq!(status, 202);
    assert_eq!(accepted["data"]["status"], "processing");
    let task_id = accepted["data"]["task_id"].as_str().unwrap().to_string();

    let path = format!("/quality_check_result/{task_id}");
    let mut report = Value::Null;
    for _ in 0..50 {
        let (status, body) = app.get(&path).await;
        assert_eq!(status, 200);
        if body["data"]["status"] != "processing" {
            report = body["data"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(report["overall_score"], 4.0);
    assert_eq!(report["authenticity"]["score"], 4.0);

    let (status, _) = app.get(&path).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn batch_quality_reports_each_review() {
    let app = spawn_app(true).await;
    let (_, generated) = app.post("/generate_reviews", &request(2)).await;
    let reviews = generated["data"]["reviews"].clone();

    let (status, accepted) = app.post("/check_quality_batch", &reviews).await;
    assert_eq!(status, 202);
    let task_id = accepted["data"]["task_id"].as_str().unwrap().to_string();

    let path = format!("/quality_check_result/{task_id}");
    let mut results = Value::Null;
    for _ in 0..50 {
        let (_, body) = app.get(&path).await;
        if body["data"]["status"] != "processing" {
            results = body["data"]["results"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["index"], 1);
    assert_eq!(results[1]["report"]["overall_score"], 4.0);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let app = spawn_app(true).await;
    let (status, body) = app.get("/quality_check_result/not-a-uuid").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = app
        .get("/quality_check_result/6f1c1a9e-6a43-4a4f-9d59-6c0f5f8f2f10")
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn categories_and_health() {
    let app = spawn_app(false).await;

    let (status, body) = app.get("/categories").await;
    assert_eq!(status, 200);
    let keys: Vec<&str> = body["data"]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 6);
    assert!(keys.contains(&"home_appliance"));

    let (status, body) = app.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["models"][0]["ok"], false);
}
