use thiserror::Error;

pub type ScoreResult<T> = Result<T, ScoreError>;

/// Scoring never fails because of the model; only the task plumbing can.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// A spawned dimension task panicked or was cancelled. Safe to retry.
    #[error("scoring task failed: {0}")]
    Orchestration(String),
}

impl From<tokio::task::JoinError> for ScoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        ScoreError::Orchestration(e.to_string())
    }
}
