use std::fmt;

use serde::Serialize;

/// One axis of review quality, scored 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Authenticity,
    Consistency,
    Specificity,
    Naturalness,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Authenticity,
        Dimension::Consistency,
        Dimension::Specificity,
        Dimension::Naturalness,
    ];

    /// Label used in prompts and synthetic reasons.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Authenticity => "真实性",
            Dimension::Consistency => "一致性",
            Dimension::Specificity => "具体性",
            Dimension::Naturalness => "语言自然度",
        }
    }

    /// Whether the prompt needs the reviewer's background.
    pub fn needs_background(self) -> bool {
        matches!(self, Dimension::Authenticity)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
