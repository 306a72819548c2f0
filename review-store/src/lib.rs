//! Persistence for generated reviews and background task results.
//!
//! - [`review_log::ReviewStore`]: append-only JSONL files with per-category stats.
//! - [`task_store::TaskStore`]: TTL-bounded task results, evicted on read.

pub mod errors;
pub mod review_log;
pub mod task_store;

pub use errors::{StoreError, StoreResult};
pub use review_log::{ReviewStats, ReviewStore, SaveSummary, StoredReview};
pub use task_store::{TaskConfig, TaskState, TaskStore};
