//! Supported product categories and their static behavior records.
//!
//! Each [`Category`] maps to one [`CategoryProfile`] holding the prompt
//! focus points, reviewer-background guidance and the product fields a
//! review of that category benefits from.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{errors::GenError, model::ProductInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electronics,
    DailyNecessities,
    FoodBeverage,
    Clothing,
    HomeAppliance,
    Stationery,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::DailyNecessities,
        Category::FoodBeverage,
        Category::Clothing,
        Category::HomeAppliance,
        Category::Stationery,
    ];

    /// Wire key (`electronics`, `daily_necessities`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::DailyNecessities => "daily_necessities",
            Category::FoodBeverage => "food_beverage",
            Category::Clothing => "clothing",
            Category::HomeAppliance => "home_appliance",
            Category::Stationery => "stationery",
        }
    }

    pub fn profile(self) -> &'static CategoryProfile {
        // PROFILES is declared in `ALL` order.
        &PROFILES[self as usize]
    }
}

impl FromStr for Category {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| GenError::UnsupportedCategory(s.trim().to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Optional product attributes a category may recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    ModelNumber,
    Specifications,
    WarrantyPeriod,
    ExpirationDate,
    Material,
    Dimensions,
    PackageInfo,
    EnergyEfficiency,
    SafetyCertifications,
}

impl ProductField {
    pub fn name(self) -> &'static str {
        match self {
            ProductField::ModelNumber => "model_number",
            ProductField::Specifications => "specifications",
            ProductField::WarrantyPeriod => "warranty_period",
            ProductField::ExpirationDate => "expiration_date",
            ProductField::Material => "material",
            ProductField::Dimensions => "dimensions",
            ProductField::PackageInfo => "package_info",
            ProductField::EnergyEfficiency => "energy_efficiency",
            ProductField::SafetyCertifications => "safety_certifications",
        }
    }

    fn is_present(self, p: &ProductInfo) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        match self {
            ProductField::ModelNumber => filled(&p.model_number),
            ProductField::Specifications => !p.specifications.is_empty(),
            ProductField::WarrantyPeriod => filled(&p.warranty_period),
            ProductField::ExpirationDate => filled(&p.expiration_date),
            ProductField::Material => filled(&p.material),
            ProductField::Dimensions => filled(&p.dimensions),
            ProductField::PackageInfo => filled(&p.package_info),
            ProductField::EnergyEfficiency => filled(&p.energy_efficiency),
            ProductField::SafetyCertifications => !p.safety_certifications.is_empty(),
        }
    }
}

/// Static behavior record for one category.
#[derive(Debug)]
pub struct CategoryProfile {
    pub category: Category,
    pub display_name: &'static str,
    /// Aspects the review should pay particular attention to.
    pub focus_points: &'static [&'static str],
    /// Expectations about the simulated reviewer.
    pub background_guidance: &'static [&'static str],
    pub recommended_fields: &'static [ProductField],
}

impl CategoryProfile {
    /// Recommended fields the product leaves empty.
    pub fn missing_fields(&self, product: &ProductInfo) -> Vec<ProductField> {
        self.recommended_fields
            .iter()
            .copied()
            .filter(|f| !f.is_present(product))
            .collect()
    }
}

static PROFILES: [CategoryProfile; 6] = [
    CategoryProfile {
        category: Category::Electronics,
        display_name: "电子产品",
        focus_points: &[
            "功能性能：运行速度、功能丰富度、稳定性",
            "硬件配置和外观设计",
            "软件体验（系统流畅度、App兼容性）",
            "电池续航、散热表现",
            "售后服务、质保政策",
        ],
        background_guidance: &[
            "技术熟悉度应为\"精通\"或\"熟练\"",
            "使用经验应为\"熟练\"或\"精通\"",
            "购买目的应包含\"工作需要\"、\"个人使用\"或\"娱乐需求\"",
            "收入水平应匹配产品价格区间",
            "教育水平建议为\"本科\"或以上",
        ],
        recommended_fields: &[
            ProductField::ModelNumber,
            ProductField::Specifications,
            ProductField::WarrantyPeriod,
        ],
    },
    CategoryProfile {
        category: Category::DailyNecessities,
        display_name: "日用品",
        focus_points: &[
            "使用便捷性和实用性",
            "材质安全、环保",
            "耐用性和质量稳定性",
            "价格合理性",
            "包装设计及物流体验",
        ],
        background_guidance: &[
            "使用经验应为\"日常使用\"或\"经常使用\"",
            "购买目的应包含\"家庭使用\"、\"个人使用\"或\"生活需求\"",
            "收入水平应匹配产品价格区间",
            "使用频率应为\"每天\"或\"经常\"",
            "品牌忠诚度可影响评价倾向",
        ],
        recommended_fields: &[ProductField::Material, ProductField::PackageInfo],
    },
    CategoryProfile {
        category: Category::FoodBeverage,
        display_name: "食品饮料",
        focus_points: &[
            "口味与品质",
            "包装安全与方便",
            "保质期和新鲜度",
            "健康成分、营养价值",
            "价格合理性",
        ],
        background_guidance: &[
            "使用经验应为\"经常购买\"或\"日常消费\"",
            "购买目的应包含\"个人喜好\"、\"健康需求\"或\"日常饮食\"",
            "收入水平应匹配产品价格区间",
            "使用频率应为\"每天\"或\"经常\"",
            "地区差异可能影响口味评价",
        ],
        recommended_fields: &[ProductField::ExpirationDate, ProductField::PackageInfo],
    },
    CategoryProfile {
        category: Category::Clothing,
        display_name: "服装鞋帽",
        focus_points: &[
            "材质舒适度和耐用度",
            "款式设计和时尚度",
            "尺码合适性",
            "透气性和实用性",
            "洗护便捷性",
        ],
        background_guidance: &[
            "使用经验应为\"经常购买\"或\"时尚达人\"",
            "购买目的应包含\"个人穿着\"、\"时尚需求\"或\"日常搭配\"",
            "收入水平应匹配产品价格区间",
            "使用频率应为\"经常\"或\"日常\"",
            "地区差异可能影响尺码选择",
        ],
        recommended_fields: &[ProductField::Material, ProductField::Dimensions],
    },
    CategoryProfile {
        category: Category::HomeAppliance,
        display_name: "家用电器",
        focus_points: &[
            "功能实用性和技术先进度",
            "能耗表现和环保节能",
            "使用便捷性和维护成本",
            "售后服务和保修政策",
        ],
        background_guidance: &[
            "使用经验应为\"熟练\"或\"精通\"",
            "购买目的应包含\"家庭使用\"、\"生活需求\"或\"升级换代\"",
            "收入水平应匹配产品价格区间",
            "技术熟悉度应为\"熟悉\"或\"精通\"",
            "教育水平建议为\"高中\"或以上",
        ],
        recommended_fields: &[ProductField::EnergyEfficiency, ProductField::WarrantyPeriod],
    },
    CategoryProfile {
        category: Category::Stationery,
        display_name: "教育文具",
        focus_points: &[
            "使用安全性和环保性",
            "实用性和耐用性",
            "设计趣味性和创新点",
            "价格合理性",
        ],
        background_guidance: &[
            "使用经验应为\"经常使用\"或\"学习需求\"",
            "购买目的应包含\"学习使用\"、\"办公需求\"或\"创意需求\"",
            "收入水平应匹配产品价格区间",
            "使用频率应为\"每天\"或\"经常\"",
            "教育水平可影响使用需求",
        ],
        recommended_fields: &[ProductField::Material, ProductField::SafetyCertifications],
    },
];
