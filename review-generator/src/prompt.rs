//! Prompt builders for the primary, reduced-context and enhancement calls.
//!
//! Prompts are plain strings assembled with `push_str`; no templating engine.

use crate::model::{ProductInfo, Review, UserBackground};

/// System prompt for review generation (primary and reduced-context).
pub const REVIEW_SYSTEM_PROMPT: &str = "你是一个专业的评价生成助手。";

/// System prompt for review enhancement.
pub const ENHANCE_SYSTEM_PROMPT: &str = "你是一个专业的评价增强助手。";

/// System prompt for the web-search round before enhancement.
pub const SEARCH_SYSTEM_PROMPT: &str =
    "你是一个专业的评价增强助手，擅长使用网络搜索获取产品相关信息。";

/// System prompt for merging search findings into a review.
pub const MERGE_SYSTEM_PROMPT: &str = "你是一个专业的评价增强助手。请基于搜索结果，\
     将补充的信息自然地融入到原始评价中，以联网信息为准，保持评价的连贯性和可读性。";

/// Builds the full instruction string for one `(user, product)` pair.
///
/// Implementations are pure: same input, same output, no I/O.
pub trait PromptProvider: Send + Sync {
    fn build_prompt(&self, user: &UserBackground, product: &ProductInfo) -> String;
}

/// Registry-backed provider: a shared base prompt plus the category's focus
/// points and reviewer-background guidance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryPromptProvider;

impl PromptProvider for CategoryPromptProvider {
    fn build_prompt(&self, user: &UserBackground, product: &ProductInfo) -> String {
        let mut s = base_prompt(user, product);

        // Unknown keys are rejected before generation; the base prompt is
        // still usable on its own.
        if let Ok(category) = product.category() {
            let profile = category.profile();
            s.push_str("\n\n请特别关注以下方面：\n");
            push_numbered(&mut s, profile.focus_points);
            s.push_str("\n用户背景要求：\n");
            for g in profile.background_guidance {
                s.push_str("- ");
                s.push_str(g);
                s.push('\n');
            }
        }
        s
    }
}

fn push_line(s: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        s.push_str(&format!("- {label}：{v}\n"));
    }
}

fn push_numbered(s: &mut String, items: &[&str]) {
    for (i, item) in items.iter().enumerate() {
        s.push_str(&format!("{}. {}\n", i + 1, item));
    }
}

/// Renders the non-empty user attributes as `- 标签：值` lines.
pub fn user_lines(user: &UserBackground) -> String {
    let mut s = String::new();
    let age = user.age.map(|a| a.to_string());
    push_line(&mut s, "性别", user.gender.as_deref());
    push_line(&mut s, "年龄", age.as_deref());
    push_line(&mut s, "职业", user.occupation.as_deref());
    push_line(&mut s, "收入水平", user.income_level.as_deref());
    push_line(&mut s, "使用经验", user.experience.as_deref());
    push_line(&mut s, "技术熟悉度", user.tech_familiarity.as_deref());
    push_line(&mut s, "购买目的", user.purchase_purpose.as_deref());
    push_line(&mut s, "所在地区", user.region.as_deref());
    push_line(&mut s, "教育水平", user.education_level.as_deref());
    push_line(&mut s, "使用频率", user.usage_frequency.as_deref());
    push_line(&mut s, "品牌忠诚度", user.brand_loyalty.as_deref());
    if s.is_empty() {
        s.push_str("- 未提供\n");
    }
    s
}

fn product_lines(product: &ProductInfo) -> String {
    let mut s = String::new();
    s.push_str(&format!("- 名称：{}\n", product.name));
    let category = product
        .category()
        .map(|c| c.profile().display_name.to_string())
        .unwrap_or_else(|_| product.category.clone());
    s.push_str(&format!("- 类别：{category}\n"));
    push_line(&mut s, "价格区间", product.price_range.as_deref());
    push_line(&mut s, "品牌", product.brand.as_deref());
    push_line(&mut s, "型号", product.model_number.as_deref());
    if !product.specifications.is_empty() {
        let specs = product
            .specifications
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        s.push_str(&format!("- 规格：{specs}\n"));
    }
    push_line(&mut s, "保修期", product.warranty_period.as_deref());
    push_line(&mut s, "有效期", product.expiration_date.as_deref());
    push_line(&mut s, "材质", product.material.as_deref());
    push_line(&mut s, "重量", product.weight.as_deref());
    push_line(&mut s, "尺寸", product.dimensions.as_deref());
    push_line(&mut s, "包装信息", product.package_info.as_deref());
    push_line(&mut s, "能效等级", product.energy_efficiency.as_deref());
    if !product.safety_certifications.is_empty() {
        s.push_str(&format!("- 安全认证：{}\n", product.safety_certifications.join(", ")));
    }
    push_line(&mut s, "使用说明", product.usage_instructions.as_deref());
    if !product.features.is_empty() {
        s.push_str(&format!("- 特点：{}\n", product.features.join(", ")));
    }
    for (k, v) in &product.additional_info {
        s.push_str(&format!("- {k}：{v}\n"));
    }
    s
}

fn base_prompt(user: &UserBackground, product: &ProductInfo) -> String {
    let mut s = String::new();
    s.push_str("请根据以下用户背景和产品信息生成一条用户评价：\n\n用户背景：\n");
    s.push_str(&user_lines(user));
    s.push_str("\n产品信息：\n");
    s.push_str(&product_lines(product));

    s.push_str("\n【推理步骤】\n");
    push_numbered(
        &mut s,
        &[
            "分析用户背景特征：用户画像、使用场景、专业程度",
            "分析产品特征：核心功能、价格定位、目标用户匹配度",
            "推导评价重点与评价语气",
            "组织评价内容，补充具体使用体验和细节",
        ],
    );
    s.push_str("\n【一致性要求】\n");
    push_numbered(
        &mut s,
        &[
            "专业术语、评价重点、价格评价要符合用户背景",
            "功能描述准确，使用体验真实，优缺点分析合理",
            "语气统一，逻辑连贯，重点突出",
        ],
    );

    s.push_str(
        "\n请以JSON对象返回评价结果，只包含以下字段：\n\
         - content: 评价内容（200-300字）\n\
         - rating: 评分（1-5的数字）\n\
         - sentiment: 情感倾向（积极/消极/中性）\n\
         - experience: 具体使用体验\n\
         - pros: 优点列表\n\
         - cons: 缺点列表\n\
         - sentiment_score: 情感倾向置信度（0-1）\n\
         - quality_score: 评价质量置信度（0-1）",
    );
    s
}

/// Minimal prompt for the reduced-context tier: occupation, age, product
/// name and at most three features. Does not ask for confidence scores.
pub fn reduced_prompt(user: &UserBackground, product: &ProductInfo) -> String {
    let occupation = user.occupation.as_deref().unwrap_or("普通用户");
    let age = user
        .age
        .map(|a| format!("{a}岁"))
        .unwrap_or_else(|| "年龄未知".to_string());
    let features = product
        .features
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut s = String::new();
    s.push_str(&format!("请生成一条关于{}的评价。\n", product.name));
    s.push_str(&format!("用户背景：{occupation}，{age}\n"));
    s.push_str(&format!("产品特点：{features}\n\n"));
    s.push_str(
        "请以JSON格式返回，包含以下字段：\n\
         - content: 评价内容\n\
         - rating: 评分(1-5)\n\
         - sentiment: 情感倾向\n\
         - experience: 使用体验\n\
         - pros: 优点列表\n\
         - cons: 缺点列表\n",
    );
    s
}

/// Prompt asking the enhancement model to enrich a finished review with
/// objective product facts while keeping its tone.
pub fn enhancement_prompt(review: &Review, findings: Option<&str>) -> String {
    let mut s = String::new();
    s.push_str("请基于以下产品评价补充相关的客观信息，使评价更加专业和可信：\n\n");
    push_product_header(&mut s, review);
    s.push_str("\n原始评价：\n");
    s.push_str(&review.content);
    if let Some(findings) = findings.map(str::trim).filter(|f| !f.is_empty()) {
        s.push_str("\n\n搜索结果：\n");
        s.push_str(findings);
        s.push_str("\n\n请将搜索结果中的信息自然地融入到原始评价中，以联网信息为准。");
    }
    s.push_str("\n\n请补充以下方面的信息：\n");
    push_numbered(&mut s, ENHANCE_ASPECTS);
    s.push_str(
        "\n请保持评价的原有风格和情感倾向，只补充客观事实和数据。\n\n\
         请以JSON格式返回，包含以下字段：\n\
         - enhanced_content: 增强后的评价内容\n\
         - added_info: 补充的信息列表\n\
         - confidence_score: 补充信息的可信度(0-1)\n\
         - pros: 更新后的优点列表\n\
         - cons: 更新后的缺点列表\n",
    );
    s
}

/// Asks a search-capable model for facts about the reviewed product.
pub fn search_prompt(review: &Review) -> String {
    let mut s = String::new();
    s.push_str("请使用网络搜索查找以下产品的最新公开信息：\n\n");
    push_product_header(&mut s, review);
    s.push_str("\n请重点查找：\n");
    push_numbered(
        &mut s,
        &[
            "产品的市场定位和竞品对比",
            "最新的用户反馈和评价趋势",
            "相关的技术参数和性能数据",
            "产品的使用场景和适用人群",
        ],
    );
    s.push_str("\n请用简洁的条目列出查到的客观事实，并注明来源。\n");
    s
}

const ENHANCE_ASPECTS: &[&str] = &[
    "产品的市场定位和竞品对比",
    "相关的技术参数和性能数据",
    "产品的使用场景和适用人群",
];

fn push_product_header(s: &mut String, review: &Review) {
    let p = &review.product_info;
    s.push_str(&format!("产品名称：{}\n", p.name));
    s.push_str(&format!("产品类别：{}\n", p.category));
    if let Some(brand) = p.brand.as_deref() {
        s.push_str(&format!("产品品牌：{brand}\n"));
    }
    if !p.specifications.is_empty() {
        let specs = p
            .specifications
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        s.push_str(&format!("产品规格：{specs}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductInfo {
        ProductInfo {
            name: "ProBook X5".into(),
            category: "electronics".into(),
            features: vec!["轻薄".into(), "长续航".into(), "高分屏".into(), "指纹解锁".into()],
            ..Default::default()
        }
    }

    #[test]
    fn category_prompt_carries_profile_and_json_fields() {
        let user = UserBackground {
            occupation: Some("软件开发工程师".into()),
            age: Some(32),
            ..Default::default()
        };
        let s = CategoryPromptProvider.build_prompt(&user, &product());
        assert!(s.contains("- 职业：软件开发工程师"));
        assert!(s.contains("- 年龄：32"));
        assert!(s.contains("- 类别：电子产品"));
        assert!(s.contains("电池续航、散热表现"));
        assert!(s.contains("sentiment_score"));
        assert!(!s.contains("性别"));
    }

    #[test]
    fn reduced_prompt_keeps_three_features() {
        let s = reduced_prompt(&UserBackground::default(), &product());
        assert!(s.contains("产品特点：轻薄, 长续航, 高分屏\n"));
        assert!(!s.contains("指纹解锁"));
        assert!(s.contains("普通用户，年龄未知"));
        assert!(!s.contains("sentiment_score"));
    }

    #[test]
    fn enhancement_prompt_folds_in_search_findings() {
        let review = Review {
            user_background: UserBackground::default(),
            product_info: product(),
            rating: 4.0,
            content: "续航不错。".into(),
            sentiment: "积极".into(),
            experience: String::new(),
            pros: vec![],
            cons: vec![],
            sentiment_score: 0.8,
            quality_score: 0.8,
            origin: crate::model::ReviewOrigin::Primary,
            version: 1,
        };

        let plain = enhancement_prompt(&review, None);
        assert!(!plain.contains("搜索结果"));
        assert_eq!(enhancement_prompt(&review, Some("  ")), plain);

        let merged = enhancement_prompt(&review, Some("官方标称续航14小时"));
        assert!(merged.contains("搜索结果：\n官方标称续航14小时"));
        assert!(merged.contains("enhanced_content"));

        let query = search_prompt(&review);
        assert!(query.contains("产品名称：ProBook X5"));
        assert!(query.contains("最新的用户反馈和评价趋势"));
    }
}
