//! Scoring and analysis prompts.

use review_generator::{Review, prompt::user_lines};

use crate::dimension::Dimension;

pub const SCORING_SYSTEM_PROMPT: &str =
    "你是一个专业的评价质量检查助手。请根据评价内容的质量给出1-5分的评分，5分表示最高质量。";

pub const ANALYSIS_SYSTEM_PROMPT: &str = "你是一个专业的评价质量分析助手。";

fn criteria(dimension: Dimension) -> [&'static str; 6] {
    match dimension {
        Dimension::Authenticity => [
            "评价内容是否符合用户背景特征",
            "评价语气是否自然",
            "评价重点是否符合用户特征",
            "评价细节是否合理",
            "评价是否反映用户的使用频率和品牌忠诚度",
            "评价是否体现用户的教育水平和地区特点",
        ],
        Dimension::Consistency => [
            "评价观点是否前后一致",
            "评价重点是否突出",
            "评价逻辑是否连贯",
            "评价结论是否合理",
            "评价内容是否与用户背景保持一致",
            "评价语气是否统一",
        ],
        Dimension::Specificity => [
            "是否包含具体的使用场景",
            "是否描述具体的产品特点",
            "是否提供具体的体验细节",
            "是否给出具体的优缺点",
            "是否包含具体的使用频率和场景",
            "是否提供具体的品牌对比和选择理由",
        ],
        Dimension::Naturalness => [
            "语言表达是否自然流畅",
            "用词是否符合用户特征",
            "语气是否真实自然",
            "是否避免过于营销化的表达",
            "是否体现用户的教育水平和专业背景",
            "是否使用符合用户年龄和职业的表达方式",
        ],
    }
}

/// Prompt for one dimension. Only authenticity sees the user background.
pub fn dimension_prompt(dimension: Dimension, review: &Review) -> String {
    let label = dimension.label();
    let mut s = String::new();
    s.push_str(&format!("请评估以下用户评价的{label}：\n\n"));
    s.push_str("评价内容：\n");
    s.push_str(&review.content);
    s.push_str("\n\n");

    if dimension.needs_background() {
        s.push_str("用户背景：\n");
        s.push_str(&user_lines(&review.user_background));
        s.push('\n');
    }

    s.push_str(&format!("请从1-5分评估这段评价的{label}，考虑：\n"));
    for (i, c) in criteria(dimension).iter().enumerate() {
        s.push_str(&format!("{}. {}\n", i + 1, c));
    }
    s.push_str("\n请以JSON格式返回，示例格式如下：\n");
    s.push_str("{\"score\": 4.5, \"reason\": \"评分理由\"}\n");
    s
}

/// Prompt for the free-text analysis, embedding the four final scores.
pub fn analysis_prompt(content: &str, scores: &[(Dimension, f64)]) -> String {
    let mut s = String::new();
    s.push_str("请对以下用户评价进行质量分析：\n\n");
    s.push_str("评价内容：\n");
    s.push_str(content);
    s.push_str("\n\n质量评分：\n");
    let joined = scores
        .iter()
        .map(|(d, v)| format!("{}: {:.1}", d.label(), v))
        .collect::<Vec<_>>()
        .join(", ");
    s.push_str(&joined);
    s.push_str("\n\n请从以下维度进行分析：\n");
    s.push_str("1. 真实性：评价内容是否符合用户背景特征\n");
    s.push_str("2. 一致性：评价观点是否前后一致，逻辑是否连贯\n");
    s.push_str("3. 具体性：是否包含具体的使用场景和体验细节\n");
    s.push_str("4. 语言自然度：表达是否自然，是否符合用户特征\n");
    s.push_str("5. 用户特征体现：是否充分体现用户的教育水平、使用频率和品牌偏好\n");
    s.push_str("6. 产品特点描述：是否准确描述产品特点和优势\n");
    s.push_str("\n请以JSON格式返回分析结果，示例格式如下：\n");
    s.push_str("{\"analysis\": [\"分析要点1\", \"分析要点2\"]}\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_generator::{ProductInfo, ReviewOrigin, UserBackground};

    fn review() -> Review {
        Review {
            user_background: UserBackground {
                occupation: Some("教师".into()),
                ..Default::default()
            },
            product_info: ProductInfo {
                name: "电饭煲".into(),
                category: "home_appliance".into(),
                ..Default::default()
            },
            rating: 4.0,
            content: "煮饭很香".into(),
            sentiment: "积极".into(),
            experience: String::new(),
            pros: vec![],
            cons: vec![],
            sentiment_score: 0.8,
            quality_score: 0.8,
            origin: ReviewOrigin::Primary,
            version: 1,
        }
    }

    #[test]
    fn only_authenticity_includes_background() {
        let r = review();
        assert!(dimension_prompt(Dimension::Authenticity, &r).contains("职业：教师"));
        for d in [Dimension::Consistency, Dimension::Specificity, Dimension::Naturalness] {
            let p = dimension_prompt(d, &r);
            assert!(!p.contains("用户背景："), "{d} prompt leaked background");
            assert!(p.contains("煮饭很香"));
        }
    }

    #[test]
    fn analysis_prompt_embeds_scores() {
        let p = analysis_prompt(
            "不错",
            &[(Dimension::Authenticity, 4.0), (Dimension::Naturalness, 2.5)],
        );
        assert!(p.contains("真实性: 4.0, 语言自然度: 2.5"));
    }
}
