use serde::Serialize;

use crate::dimension::Dimension;

/// Lowest and highest dimension score.
pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Placeholder used when the analysis call does not yield usable statements.
pub const ANALYSIS_PLACEHOLDER: &str = "无法生成分析报告";

/// Reason recorded when the model returns a score without one.
pub const MISSING_REASON: &str = "模型未给出评分理由";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScore {
    pub score: f64,
    pub reason: String,
}

impl DimensionScore {
    /// Clamps `score` into `[MIN_SCORE, MAX_SCORE]`.
    pub fn clamped(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score: score.clamp(MIN_SCORE, MAX_SCORE),
            reason: reason.into(),
        }
    }

    /// Minimum score with a synthetic, non-empty reason.
    pub fn failed(dimension: Dimension, cause: impl std::fmt::Display) -> Self {
        Self {
            score: MIN_SCORE,
            reason: format!("{dimension}检查失败: {cause}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub authenticity: DimensionScore,
    pub consistency: DimensionScore,
    pub specificity: DimensionScore,
    pub naturalness: DimensionScore,
    /// Unweighted mean of the four dimension scores.
    pub overall_score: f64,
    pub analysis: Vec<String>,
}

impl ScoreReport {
    pub(crate) fn pending() -> Self {
        let blank = DimensionScore {
            score: MIN_SCORE,
            reason: String::new(),
        };
        Self {
            authenticity: blank.clone(),
            consistency: blank.clone(),
            specificity: blank.clone(),
            naturalness: blank,
            overall_score: MIN_SCORE,
            analysis: Vec::new(),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &DimensionScore {
        match dimension {
            Dimension::Authenticity => &self.authenticity,
            Dimension::Consistency => &self.consistency,
            Dimension::Specificity => &self.specificity,
            Dimension::Naturalness => &self.naturalness,
        }
    }

    pub(crate) fn get_mut(&mut self, dimension: Dimension) -> &mut DimensionScore {
        match dimension {
            Dimension::Authenticity => &mut self.authenticity,
            Dimension::Consistency => &mut self.consistency,
            Dimension::Specificity => &mut self.specificity,
            Dimension::Naturalness => &mut self.naturalness,
        }
    }

    pub fn scores(&self) -> [(Dimension, f64); 4] {
        Dimension::ALL.map(|d| (d, self.get(d).score))
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
