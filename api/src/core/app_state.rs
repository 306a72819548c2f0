use std::sync::Arc;

use ai_llm_service::{LlmServiceProfiles, health_service::HealthStatus};
use quality_scorer::{QualityScorer, ScorerConfig};
use review_generator::{
    CategoryPromptProvider, GenerationConfig, GenerationPipeline, ReviewEnhancer,
};
use review_store::{ReviewStore, TaskConfig, TaskStore};

use crate::{error_handler::AppResult, routes::quality::quality_task::QualityTaskResult};

pub type QualityTasks = TaskStore<QualityTaskResult>;

/// Probes model backends for `/health`.
pub trait HealthProbe: Send + Sync {
    fn probe(&self) -> std::pin::Pin<Box<dyn Future<Output = Vec<HealthStatus>> + Send + '_>>;
}

impl HealthProbe for LlmServiceProfiles {
    fn probe(&self) -> std::pin::Pin<Box<dyn Future<Output = Vec<HealthStatus>> + Send + '_>> {
        Box::pin(self.health_all())
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: GenerationPipeline,
    pub enhancer: ReviewEnhancer,
    pub scorer: QualityScorer,
    pub reviews: Arc<ReviewStore>,
    pub tasks: Arc<QualityTasks>,
    pub health: Arc<dyn HealthProbe>,
}

impl AppState {
    /// Builds every service from environment variables.
    ///
    /// The pipeline and the scorer use the `primary` profile, the enhancer
    /// uses `enhancement`.
    pub async fn from_env() -> AppResult<Self> {
        let profiles = Arc::new(LlmServiceProfiles::from_env()?);
        let gen_cfg = GenerationConfig::from_env()?;
        let scorer_cfg = ScorerConfig::from_env()?;
        let task_cfg = TaskConfig::from_env()?;

        Ok(Self {
            pipeline: GenerationPipeline::new(
                profiles.primary(),
                Arc::new(CategoryPromptProvider),
                gen_cfg.clone(),
            ),
            enhancer: ReviewEnhancer::new(profiles.enhancement(), gen_cfg),
            scorer: QualityScorer::new(profiles.primary(), scorer_cfg),
            reviews: Arc::new(ReviewStore::from_env().await?),
            tasks: Arc::new(TaskStore::new(task_cfg)),
            health: profiles,
        })
    }
}
