//! Batch generation with per-item isolation.
//!
//! Items run concurrently through `buffer_unordered` (bounded by
//! `batch_concurrency`) and share no mutable state. Each item reports its own
//! outcome; one failure never affects the others.

use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    errors::GenResult,
    model::{ProductInfo, Review, UserBackground},
    pipeline::{FallbackTier, GenerationOutcome, GenerationPipeline},
};

/// Public per-item status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Generated,
    FellBack { tier: FallbackTier },
    Failed { error: String },
}

#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub result: GenResult<GenerationOutcome>,
}

impl BatchItem {
    pub fn status(&self) -> ItemStatus {
        match &self.result {
            Ok(o) => match o.fallback_tier() {
                None => ItemStatus::Generated,
                Some(tier) => ItemStatus::FellBack { tier },
            },
            Err(e) => ItemStatus::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Results of one batch, ordered by item index.
#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn statuses(&self) -> Vec<ItemStatus> {
        self.items.iter().map(BatchItem::status).collect()
    }

    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_err()).count()
    }

    /// Splits into the produced reviews (index order) and every item's status.
    pub fn into_partial(self) -> (Vec<Review>, Vec<ItemStatus>) {
        let statuses = self.statuses();
        let reviews = self
            .items
            .into_iter()
            .filter_map(|i| i.result.ok().map(|o| o.review))
            .collect();
        (reviews, statuses)
    }

    /// Strict view: every review, or the first error.
    pub fn into_all_or_nothing(self) -> GenResult<Vec<Review>> {
        self.items
            .into_iter()
            .map(|i| i.result.map(|o| o.review))
            .collect()
    }
}

impl GenerationPipeline {
    /// Runs `count` independent pipelines for the same `(user, product)`.
    ///
    /// An unsupported category fails every item the same way; callers that
    /// validated the request first never see that.
    #[instrument(skip_all, fields(product = %product.name, count = count))]
    pub async fn generate_batch(
        &self,
        user: &UserBackground,
        product: &ProductInfo,
        count: usize,
    ) -> BatchReport {
        let concurrency = self.config().batch_concurrency.max(1);

        let mut items: Vec<BatchItem> = stream::iter(0..count)
            .map(|index| async move {
                BatchItem {
                    index,
                    result: self.generate_with_trace(user, product).await,
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        items.sort_by_key(|i| i.index);

        let report = BatchReport { items };
        info!(
            requested = count,
            failed = report.failed_count(),
            fell_back = report
                .items
                .iter()
                .filter(|i| matches!(i.status(), ItemStatus::FellBack { .. }))
                .count(),
            "batch generation finished"
        );
        report
    }
}
