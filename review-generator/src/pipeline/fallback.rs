//! Fallback tiers, tried in fixed order once primary attempts are exhausted.
//!
//! Each tier is strictly less informative and strictly more likely to
//! succeed than the one before it. Confidence scores are fixed per tier.

use ai_llm_service::CompletionParams;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{GenerationPipeline, assemble, parse};
use crate::{
    errors::TierError,
    model::{ProductInfo, Review, ReviewOrigin, UserBackground},
    prompt::{REVIEW_SYSTEM_PROMPT, reduced_prompt},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Minimal prompt, single call, no JSON mode.
    ReducedContext,
    /// Local phrase template, no model call.
    Template,
    /// Neutral review naming the product only.
    HardFallback,
}

impl FallbackTier {
    pub const CHAIN: [FallbackTier; 3] = [
        FallbackTier::ReducedContext,
        FallbackTier::Template,
        FallbackTier::HardFallback,
    ];

    /// Fixed `(sentiment_score, quality_score)` assigned by this tier.
    pub fn confidence(self) -> (f64, f64) {
        match self {
            FallbackTier::ReducedContext => (0.7, 0.7),
            FallbackTier::Template => (0.6, 0.6),
            FallbackTier::HardFallback => (0.5, 0.5),
        }
    }

    pub fn origin(self) -> ReviewOrigin {
        match self {
            FallbackTier::ReducedContext => ReviewOrigin::ReducedContext,
            FallbackTier::Template => ReviewOrigin::Template,
            FallbackTier::HardFallback => ReviewOrigin::HardFallback,
        }
    }

    pub fn from_origin(origin: ReviewOrigin) -> Option<Self> {
        match origin {
            ReviewOrigin::ReducedContext => Some(FallbackTier::ReducedContext),
            ReviewOrigin::Template => Some(FallbackTier::Template),
            ReviewOrigin::HardFallback => Some(FallbackTier::HardFallback),
            ReviewOrigin::Primary | ReviewOrigin::Enhanced => None,
        }
    }
}

impl GenerationPipeline {
    pub(super) async fn run_tier(
        &self,
        tier: FallbackTier,
        user: &UserBackground,
        product: &ProductInfo,
    ) -> Result<Review, TierError> {
        match tier {
            FallbackTier::ReducedContext => self.reduced_context(user, product).await,
            FallbackTier::Template => {
                let mut rng = rand::thread_rng();
                template_review(user, product, &mut rng)
            }
            FallbackTier::HardFallback => hard_fallback_review(user, product),
        }
    }

    async fn reduced_context(
        &self,
        user: &UserBackground,
        product: &ProductInfo,
    ) -> Result<Review, TierError> {
        let prompt = reduced_prompt(user, product);
        let params = CompletionParams::text(self.cfg.temperature, self.cfg.max_tokens);

        let raw = self.call(REVIEW_SYSTEM_PROMPT, &prompt, params).await?;
        let parsed = parse::parse_reduced(&raw)?;

        let tier = FallbackTier::ReducedContext;
        Ok(assemble(user, product, parsed, tier.confidence(), tier.origin()))
    }
}

const EXPERIENCE_PHRASES: &[&str] = &["非常好用", "使用体验不错", "基本满足需求"];
const VERDICT_PHRASES: &[&str] = &["推荐购买", "值得考虑", "可以考虑"];

/// Synthesizes a review from fixed phrase sets and one random feature.
///
/// Rating is uniform in `[3.5, 5.0]`, rounded to one decimal.
pub(crate) fn template_review<R: Rng + ?Sized>(
    user: &UserBackground,
    product: &ProductInfo,
    rng: &mut R,
) -> Result<Review, TierError> {
    let feature = product
        .features
        .iter()
        .filter(|f| !f.trim().is_empty())
        .collect::<Vec<_>>()
        .choose(rng)
        .map(|f| f.trim().to_string())
        .ok_or(TierError::NoFeatures)?;

    let experience = EXPERIENCE_PHRASES.choose(rng).copied().unwrap_or("基本满足需求");
    let verdict = VERDICT_PHRASES.choose(rng).copied().unwrap_or("可以考虑");
    let rating = (rng.gen_range(3.5..=5.0_f64) * 10.0).round() / 10.0;
    let occupation = user.occupation.as_deref().unwrap_or("普通用户");

    let content = format!(
        "作为一位{occupation}，我对{name}的评价如下：\n\n\
         [使用体验]\n{experience}\n\n\
         [优点]\n- {feature}\n- 性价比高\n- 质量可靠\n\n\
         [缺点]\n- 有待改进\n- 可以更好\n\n\
         [总体评价]\n{verdict}\n\n\
         评分：{rating}分",
        name = product.name,
    );

    let tier = FallbackTier::Template;
    let (sentiment_score, quality_score) = tier.confidence();
    Ok(Review {
        user_background: user.clone(),
        product_info: product.clone(),
        rating,
        content,
        sentiment: "positive".into(),
        experience: experience.to_string(),
        pros: vec![feature, "性价比高".into(), "质量可靠".into()],
        cons: vec!["有待改进".into(), "可以更好".into()],
        sentiment_score,
        quality_score,
        origin: tier.origin(),
        version: 1,
    })
}

/// Minimal neutral review; fails only when there is no name to reference.
pub(crate) fn hard_fallback_review(
    user: &UserBackground,
    product: &ProductInfo,
) -> Result<Review, TierError> {
    let name = product.name.trim();
    if name.is_empty() {
        return Err(TierError::BlankProductName);
    }

    let tier = FallbackTier::HardFallback;
    let (sentiment_score, quality_score) = tier.confidence();
    Ok(Review {
        user_background: user.clone(),
        product_info: product.clone(),
        rating: 3.0,
        content: format!("这是一条关于{name}的评价。"),
        sentiment: "neutral".into(),
        experience: "基本可用".into(),
        pros: vec!["基本功能完整".into()],
        cons: vec!["有待改进".into()],
        sentiment_score,
        quality_score,
        origin: tier.origin(),
        version: 1,
    })
}
