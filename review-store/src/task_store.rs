//! In-memory results for background tasks.
//!
//! A task is inserted as `Processing` on submit, moved to `Completed` or
//! `Failed` by its worker, and evicted either when a finished result is read
//! or when it outlives the TTL.

use std::{collections::HashMap, sync::Arc, time::Duration};

use ai_llm_service::error_handler::env_opt_u64;
use chrono::{DateTime, Utc};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    /// Age after which any task is dropped.
    pub ttl: Duration,
    /// How often the sweeper runs.
    pub cleanup_interval: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl TaskConfig {
    /// Reads `TASK_TIMEOUT_SECS` and `TASK_CLEANUP_INTERVAL_SECS`.
    pub fn from_env() -> ai_llm_service::Result<Self> {
        let d = Self::default();
        Ok(Self {
            ttl: env_opt_u64("TASK_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.ttl),
            cleanup_interval: env_opt_u64("TASK_CLEANUP_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.cleanup_interval),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState<T> {
    Processing,
    Completed(T),
    Failed(String),
}

#[derive(Debug)]
struct Entry<T> {
    state: TaskState<T>,
    created_at: DateTime<Utc>,
}

/// Task id → state map guarded by an async `RwLock`.
#[derive(Debug)]
pub struct TaskStore<T> {
    tasks: RwLock<HashMap<Uuid, Entry<T>>>,
    cfg: TaskConfig,
}

impl<T: Clone + Send + Sync + 'static> TaskStore<T> {
    pub fn new(cfg: TaskConfig) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            cfg,
        }
    }

    pub fn config(&self) -> TaskConfig {
        self.cfg
    }

    /// Registers a new task in the `Processing` state.
    pub async fn submit(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.tasks.write().await.insert(
            id,
            Entry {
                state: TaskState::Processing,
                created_at: Utc::now(),
            },
        );
        debug!(task_id = %id, "task submitted");
        id
    }

    pub async fn complete(&self, id: Uuid, value: T) {
        self.finish(id, TaskState::Completed(value)).await;
    }

    pub async fn fail(&self, id: Uuid, error: impl Into<String>) {
        self.finish(id, TaskState::Failed(error.into())).await;
    }

    async fn finish(&self, id: Uuid, state: TaskState<T>) {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(entry) => entry.state = state,
            // Swept while the worker was still running; nobody can read it now.
            None => warn!(task_id = %id, "finished task no longer tracked"),
        }
    }

    /// Reads a task. Finished tasks are evicted by the read; `Processing`
    /// stays. `None` for unknown or expired ids.
    pub async fn take(&self, id: Uuid) -> Option<TaskState<T>> {
        let mut tasks = self.tasks.write().await;
        let entry = tasks.get(&id)?;
        if self.is_expired(entry, Utc::now()) {
            tasks.remove(&id);
            return None;
        }
        if matches!(entry.state, TaskState::Processing) {
            return Some(TaskState::Processing);
        }
        tasks.remove(&id).map(|e| e.state)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Drops every task older than the TTL. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, e| !self.is_expired(e, now));
        let removed = before - tasks.len();
        if removed > 0 {
            info!(removed, remaining = tasks.len(), "expired tasks swept");
        }
        removed
    }

    /// Runs [`sweep_expired`](Self::sweep_expired) every `cleanup_interval`.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(store.cfg.cleanup_interval);
            // The first tick fires immediately.
            tick.tick().await;
            loop {
                tick.tick().await;
                store.sweep_expired().await;
            }
        })
    }

    fn is_expired(&self, entry: &Entry<T>, now: DateTime<Utc>) -> bool {
        (now - entry.created_at)
            .to_std()
            .map(|age| age > self.cfg.ttl)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> TaskStore<u32> {
        TaskStore::new(TaskConfig {
            ttl,
            cleanup_interval: Duration::from_millis(20),
        })
    }

    #[tokio::test]
    async fn completed_result_is_evicted_on_read() {
        let s = store(Duration::from_secs(60));
        let id = s.submit().await;
        assert_eq!(s.take(id).await, Some(TaskState::Processing));
        assert_eq!(s.len().await, 1);

        s.complete(id, 7).await;
        assert_eq!(s.take(id).await, Some(TaskState::Completed(7)));
        assert_eq!(s.take(id).await, None);
    }

    #[tokio::test]
    async fn failure_is_evicted_on_read() {
        let s = store(Duration::from_secs(60));
        let id = s.submit().await;
        s.fail(id, "boom").await;
        assert_eq!(s.take(id).await, Some(TaskState::Failed("boom".into())));
        assert!(s.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let s = store(Duration::from_secs(60));
        assert_eq!(s.take(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn expired_tasks_are_swept() {
        let s = store(Duration::from_millis(10));
        let a = s.submit().await;
        s.complete(a, 1).await;
        s.submit().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(s.sweep_expired().await, 2);
        assert_eq!(s.take(a).await, None);
    }

    #[tokio::test]
    async fn expired_task_is_not_returned_before_sweep() {
        let s = store(Duration::from_millis(10));
        let id = s.submit().await;
        s.complete(id, 3).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(s.take(id).await, None);
    }

    #[tokio::test]
    async fn sweeper_runs_in_background() {
        let s = Arc::new(store(Duration::from_millis(5)));
        s.submit().await;
        let handle = s.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(s.is_empty().await);
        handle.abort();
    }
}
