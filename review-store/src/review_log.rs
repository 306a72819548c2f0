//! Append-only review log.
//!
//! - One JSONL file per category and UTC day: `{category}_reviews_{YYYYMMDD}.jsonl`.
//! - Writers to the same file are serialized by an async mutex; the guard
//!   lives only for one append. Idle locks for other files are pruned.
//! - Rows that fail validation are skipped and counted, never written.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use ai_llm_service::error_handler::env_opt;
use chrono::{DateTime, Utc};
use review_generator::{Category, Review};
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex as AsyncMutex};
use tracing::{debug, info, instrument, warn};

use crate::errors::{StoreError, StoreResult};

pub const DEFAULT_SAVE_PATH: &str = "data/reviews";

/// One persisted line: the review plus when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    #[serde(flatten)]
    pub review: Review,
    pub generation_time: DateTime<Utc>,
}

/// Outcome of one [`ReviewStore::save_reviews`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub written: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: u64,
    pub average_rating: f64,
    /// Keyed by the integer part of the rating (`"1"`..`"5"`).
    pub rating_distribution: BTreeMap<String, u64>,
    pub sentiment_distribution: BTreeMap<String, u64>,
}

pub struct ReviewStore {
    dir: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl ReviewStore {
    /// Creates the store and its directory if missing.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!(path = %dir.display(), "review store ready");
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Opens the directory named by `REVIEWS_SAVE_PATH` (default `data/reviews`).
    pub async fn from_env() -> StoreResult<Self> {
        let dir = env_opt("REVIEWS_SAVE_PATH").unwrap_or_else(|| DEFAULT_SAVE_PATH.to_string());
        Self::open(dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Appends every valid review to today's file for `category`.
    #[instrument(skip_all, fields(category = %category, count = reviews.len()))]
    pub async fn save_reviews(&self, reviews: &[Review], category: &str) -> StoreResult<SaveSummary> {
        let category = parse_category(category)?;
        let now = Utc::now();
        let path = self.file_for(category, now);

        let mut buf = String::new();
        let mut summary = SaveSummary::default();
        for review in reviews {
            if let Err(reason) = validate(review) {
                warn!(product = %review.product_info.name, %reason, "rejected review row");
                summary.rejected += 1;
                continue;
            }
            let row = StoredReview {
                review: review.clone(),
                generation_time: now,
            };
            buf.push_str(&serde_json::to_string(&row)?);
            buf.push('\n');
            summary.written += 1;
        }

        if summary.written > 0 {
            let lock = self.lock_for(&path);
            let _guard = lock.lock().await;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(buf.as_bytes()).await?;
            file.flush().await?;
        }

        info!(
            path = %path.display(),
            written = summary.written,
            rejected = summary.rejected,
            "reviews saved"
        );
        Ok(summary)
    }

    /// Aggregates every stored day for `category`. Unreadable lines are skipped.
    #[instrument(skip(self))]
    pub async fn stats(&self, category: &str) -> StoreResult<ReviewStats> {
        let category = parse_category(category)?;
        let prefix = format!("{}_reviews_", category.key());

        let mut stats = ReviewStats::default();
        let mut rating_sum = 0.0;

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(".jsonl") {
                continue;
            }

            let text = fs::read_to_string(entry.path()).await?;
            for (lineno, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let row: StoredReview = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(file = %name, line = lineno + 1, error = %e, "skipping unreadable row");
                        continue;
                    }
                };
                let review = row.review;
                stats.total_reviews += 1;
                rating_sum += review.rating;
                *stats
                    .rating_distribution
                    .entry((review.rating.trunc() as i64).to_string())
                    .or_default() += 1;
                *stats
                    .sentiment_distribution
                    .entry(review.sentiment)
                    .or_default() += 1;
            }
        }

        if stats.total_reviews > 0 {
            stats.average_rating = rating_sum / stats.total_reviews as f64;
        }
        debug!(total = stats.total_reviews, "stats computed");
        Ok(stats)
    }

    fn file_for(&self, category: Category, at: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("{}_reviews_{}.jsonl", category.key(), at.format("%Y%m%d")))
    }

    /// Lock for `path`. Locks of other files that nobody holds are dropped,
    /// so past days do not accumulate.
    fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        // A poisoned map only means another writer panicked between lookups.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|p, lock| p == path || Arc::strong_count(lock) > 1);
        locks.entry(path.to_path_buf()).or_default().clone()
    }
}

fn parse_category(raw: &str) -> StoreResult<Category> {
    raw.parse::<Category>()
        .map_err(|e| StoreError::Validation(e.to_string()))
}

/// Row-level checks applied before anything is written.
fn validate(review: &Review) -> Result<(), String> {
    if review.product_info.name.trim().is_empty() {
        return Err("blank product name".into());
    }
    if review.product_info.category.trim().is_empty() {
        return Err("blank product category".into());
    }
    if review.content.trim().is_empty() {
        return Err("blank content".into());
    }
    if !(1.0..=5.0).contains(&review.rating) {
        return Err(format!("rating {} out of range", review.rating));
    }
    for (field, v) in [
        ("sentiment_score", review.sentiment_score),
        ("quality_score", review.quality_score),
    ] {
        if !(0.0..=1.0).contains(&v) {
            return Err(format!("{field} {v} out of range"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use review_generator::{ProductInfo, ReviewOrigin, UserBackground};

    use super::*;

    fn review(rating: f64, sentiment: &str) -> Review {
        Review {
            user_background: UserBackground::default(),
            product_info: ProductInfo {
                name: "保温杯".into(),
                category: "daily_necessities".into(),
                ..Default::default()
            },
            rating,
            content: "保温效果好".into(),
            sentiment: sentiment.into(),
            experience: String::new(),
            pros: vec![],
            cons: vec![],
            sentiment_score: 0.8,
            quality_score: 0.7,
            origin: ReviewOrigin::Primary,
            version: 1,
        }
    }

    #[tokio::test]
    async fn saves_valid_rows_and_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::open(dir.path()).await.unwrap();

        let mut bad_score = review(4.0, "积极");
        bad_score.quality_score = 1.2;
        let summary = store
            .save_reviews(
                &[review(4.0, "积极"), review(6.0, "积极"), bad_score],
                "daily_necessities",
            )
            .await
            .unwrap();
        assert_eq!(summary, SaveSummary { written: 1, rejected: 2 });

        let path = store.file_for(Category::DailyNecessities, Utc::now());
        let text = std::fs::read_to_string(path).unwrap();
        let row: StoredReview = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(row.review, review(4.0, "积极"));
    }

    #[tokio::test]
    async fn stats_aggregate_ratings_and_sentiments() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::open(dir.path()).await.unwrap();
        store
            .save_reviews(
                &[review(4.5, "积极"), review(4.0, "积极"), review(2.0, "消极")],
                "daily_necessities",
            )
            .await
            .unwrap();

        let stats = store.stats("daily_necessities").await.unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert!((stats.average_rating - 3.5).abs() < 1e-9);
        assert_eq!(stats.rating_distribution.get("4"), Some(&2));
        assert_eq!(stats.rating_distribution.get("2"), Some(&1));
        assert_eq!(stats.sentiment_distribution.get("积极"), Some(&2));

        let empty = store.stats("clothing").await.unwrap();
        assert_eq!(empty, ReviewStats::default());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ReviewStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let batch = vec![review(4.0, "积极"); 5];
                store.save_reviews(&batch, "daily_necessities").await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stats = store.stats("daily_necessities").await.unwrap();
        assert_eq!(stats.total_reviews, 40);
    }

    #[tokio::test]
    async fn unknown_category_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.save_reviews(&[review(4.0, "积极")], "toys").await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(store.stats("../etc").await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn idle_locks_for_other_files_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::open(dir.path()).await.unwrap();
        let yesterday = Utc::now() - chrono::Duration::days(1);
        let old = store.file_for(Category::Clothing, yesterday);
        let today = store.file_for(Category::Clothing, Utc::now());

        drop(store.lock_for(&old));
        drop(store.lock_for(&today));
        assert_eq!(store.locks.lock().unwrap().len(), 1);
        assert!(store.locks.lock().unwrap().contains_key(&today));

        // A lock someone still holds survives pruning.
        let held = store.lock_for(&old);
        let _guard = held.lock().await;
        drop(store.lock_for(&today));
        assert_eq!(store.locks.lock().unwrap().len(), 2);
    }
}
