use quality_scorer::{ScoreReport, ScoreResult};
use serde::Serialize;
use uuid::Uuid;

/// Stored outcome of a background quality check.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QualityTaskResult {
    Single(ScoreReport),
    Batch { results: Vec<BatchScoreEntry> },
}

/// One review of a batch check; exactly one of `report` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct BatchScoreEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ScoreReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchScoreEntry {
    pub fn from_result(index: usize, result: ScoreResult<ScoreReport>) -> Self {
        match result {
            Ok(report) => Self {
                index,
                report: Some(report),
                error: None,
            },
            Err(e) => Self {
                index,
                report: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Body returned when a check is accepted.
#[derive(Debug, Serialize)]
pub struct TaskAccepted {
    pub task_id: Uuid,
    pub status: &'static str,
    pub message: &'static str,
}

/// Body returned while a check is still running.
#[derive(Debug, Serialize)]
pub struct TaskPending {
    pub status: &'static str,
    pub message: &'static str,
}
