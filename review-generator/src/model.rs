//! Request and review value types shared by the pipeline, the enhancer, the
//! scorer, the store and the HTTP layer.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    category::Category,
    errors::{GenError, GenResult},
};

/// Upper bound for `ReviewRequest::num_reviews`.
pub const MAX_REVIEWS_PER_REQUEST: u32 = 10;

/// Sparse description of the simulated reviewer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserBackground {
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub occupation: Option<String>,
    pub income_level: Option<String>,
    /// Experience level with this kind of product ("新手", "熟练", ...).
    pub experience: Option<String>,
    pub tech_familiarity: Option<String>,
    pub purchase_purpose: Option<String>,
    pub region: Option<String>,
    pub education_level: Option<String>,
    pub usage_frequency: Option<String>,
    pub brand_loyalty: Option<String>,
}

/// Product attributes. `name` and `category` are required; the rest matter
/// only for some categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    /// Category key, e.g. `electronics` (see [`Category`]).
    pub category: String,
    pub price_range: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    pub warranty_period: Option<String>,
    pub expiration_date: Option<String>,
    pub material: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub package_info: Option<String>,
    pub energy_efficiency: Option<String>,
    #[serde(default)]
    pub safety_certifications: Vec<String>,
    pub usage_instructions: Option<String>,
    #[serde(default)]
    pub additional_info: BTreeMap<String, String>,
}

impl ProductInfo {
    /// Resolves the category key.
    pub fn category(&self) -> GenResult<Category> {
        Category::from_str(&self.category)
    }
}

fn default_num_reviews() -> u32 {
    1
}

/// Immutable generation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub user_background: UserBackground,
    pub product_info: ProductInfo,
    #[serde(default = "default_num_reviews")]
    pub num_reviews: u32,
}

impl ReviewRequest {
    /// Checks the request invariants and returns the resolved category.
    ///
    /// # Errors
    /// - [`GenError::Validation`] if `num_reviews ∉ [1, 10]` or the name is blank
    /// - [`GenError::UnsupportedCategory`] for unknown category keys
    pub fn validate(&self) -> GenResult<Category> {
        if !(1..=MAX_REVIEWS_PER_REQUEST).contains(&self.num_reviews) {
            return Err(GenError::Validation(format!(
                "num_reviews must be within 1..={MAX_REVIEWS_PER_REQUEST}, got {}",
                self.num_reviews
            )));
        }
        if self.product_info.name.trim().is_empty() {
            return Err(GenError::Validation("product_info.name must not be blank".into()));
        }
        self.product_info.category()
    }
}

/// Which stage produced a [`Review`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOrigin {
    Primary,
    ReducedContext,
    Template,
    HardFallback,
    Enhanced,
}

/// A generated review. Never mutated after it is returned; enhancement
/// produces a new value with a higher `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_background: UserBackground,
    pub product_info: ProductInfo,
    /// 1.0 ..= 5.0
    pub rating: f64,
    pub content: String,
    pub sentiment: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    /// 0.0 ..= 1.0
    pub sentiment_score: f64,
    /// 0.0 ..= 1.0
    pub quality_score: f64,
    #[serde(default = "default_origin")]
    pub origin: ReviewOrigin,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_origin() -> ReviewOrigin {
    ReviewOrigin::Primary
}

fn default_version() -> u32 {
    1
}

impl Review {
    /// `true` when every numeric field is inside its documented range.
    pub fn is_well_formed(&self) -> bool {
        (1.0..=5.0).contains(&self.rating)
            && (0.0..=1.0).contains(&self.sentiment_score)
            && (0.0..=1.0).contains(&self.quality_score)
    }
}
