//! Parsing and validation of model JSON into review fields.
//!
//! The model is asked for a JSON object but routinely returns code fences,
//! numbers as strings, or a single string where a list was requested. This
//! module accepts those shapes and rejects everything else with a precise
//! [`AttemptError`].

use serde_json::{Map, Value};

use crate::errors::AttemptError;

/// Review fields extracted from one model response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedReview {
    pub content: String,
    pub rating: f64,
    pub sentiment: String,
    pub experience: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// Present only when the prompt asked the model to self-score.
    pub scores: Option<(f64, f64)>,
}

/// Strips a surrounding Markdown code fence (```json ... ```), if any.
pub fn cleanup_json_like(s: &str) -> String {
    let mut t = s.trim().to_string();
    if t.starts_with("```") {
        t = t
            .trim_start_matches("```json")
            .trim_start_matches("```JSON")
            .trim_start_matches("```")
            .to_string();
        if let Some(pos) = t.rfind("```") {
            t.truncate(pos);
        }
    }
    t.trim().to_string()
}

/// Parses raw model text into a JSON object.
pub(crate) fn parse_object(raw: &str) -> Result<Map<String, Value>, AttemptError> {
    if raw.trim().is_empty() {
        return Err(AttemptError::EmptyContent);
    }
    let cleaned = cleanup_json_like(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AttemptError::InvalidJson(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AttemptError::InvalidJson(e.to_string())),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn require<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, AttemptError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(AttemptError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

/// Coerces a number or a numeric string to `f64`.
pub(crate) fn number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, AttemptError> {
    let v = require(obj, field)?;
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(AttemptError::NotNumeric {
            field,
            raw: v.to_string(),
        }),
    }
}

/// Like [`number`], additionally enforcing an inclusive range.
pub(crate) fn number_in(
    obj: &Map<String, Value>,
    field: &'static str,
    lo: f64,
    hi: f64,
) -> Result<f64, AttemptError> {
    let value = number(obj, field)?;
    if (lo..=hi).contains(&value) {
        Ok(value)
    } else {
        Err(AttemptError::OutOfRange { field, value })
    }
}

/// Required string; numbers and booleans are rendered, containers rejected.
pub(crate) fn text(obj: &Map<String, Value>, field: &'static str) -> Result<String, AttemptError> {
    match require(obj, field)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(AttemptError::WrongType(field)),
    }
}

/// Required list of strings. A lone string becomes a one-element list.
pub(crate) fn text_list(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, AttemptError> {
    match require(obj, field)? {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.trim().to_string()]),
        _ => Err(AttemptError::WrongType(field)),
    }
}

fn optional<T>(r: Result<T, AttemptError>) -> Result<Option<T>, AttemptError> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(AttemptError::MissingField(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn body(obj: &Map<String, Value>) -> Result<String, AttemptError> {
    let content = text(obj, "content")?;
    if content.is_empty() {
        return Err(AttemptError::EmptyContent);
    }
    Ok(content)
}

/// Primary response: requires content, rating, sentiment and both
/// confidence scores; experience, pros and cons are optional.
pub(crate) fn parse_primary(raw: &str) -> Result<ParsedReview, AttemptError> {
    let obj = parse_object(raw)?;

    let content = body(&obj)?;
    let rating = number_in(&obj, "rating", 1.0, 5.0)?;
    let sentiment = text(&obj, "sentiment")?;
    let sentiment_score = number_in(&obj, "sentiment_score", 0.0, 1.0)?;
    let quality_score = number_in(&obj, "quality_score", 0.0, 1.0)?;

    Ok(ParsedReview {
        content,
        rating,
        sentiment,
        experience: optional(text(&obj, "experience"))?.unwrap_or_default(),
        pros: optional(text_list(&obj, "pros"))?.unwrap_or_default(),
        cons: optional(text_list(&obj, "cons"))?.unwrap_or_default(),
        scores: Some((sentiment_score, quality_score)),
    })
}

/// Reduced-context response: requires content, rating, sentiment,
/// experience, pros and cons. Confidence scores are not expected.
pub(crate) fn parse_reduced(raw: &str) -> Result<ParsedReview, AttemptError> {
    let obj = parse_object(raw)?;

    Ok(ParsedReview {
        content: body(&obj)?,
        rating: number_in(&obj, "rating", 1.0, 5.0)?,
        sentiment: text(&obj, "sentiment")?,
        experience: text(&obj, "experience")?,
        pros: text_list(&obj, "pros")?,
        cons: text_list(&obj, "cons")?,
        scores: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{"content":"续航很扎实，编译大项目也不烫。","rating":4,
        "sentiment":"积极","sentiment_score":0.9,"quality_score":"0.85"}"#;

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```json\n{FULL}\n```");
        let p = parse_primary(&fenced).unwrap();
        assert_eq!(p.rating, 4.0);
        assert_eq!(p.scores, Some((0.9, 0.85)));
        assert!(p.pros.is_empty());
        assert_eq!(p.experience, "");
    }

    #[test]
    fn primary_rejects_missing_and_non_numeric_fields() {
        assert_eq!(
            parse_primary(r#"{"content":"x","rating":4,"sentiment":"积极","sentiment_score":0.9}"#),
            Err(AttemptError::MissingField("quality_score"))
        );
        assert!(matches!(
            parse_primary(
                r#"{"content":"x","rating":"四星","sentiment":"积极","sentiment_score":0.9,"quality_score":0.9}"#
            ),
            Err(AttemptError::NotNumeric { field: "rating", .. })
        ));
    }

    #[test]
    fn primary_rejects_out_of_range_values() {
        assert_eq!(
            parse_primary(
                r#"{"content":"x","rating":7,"sentiment":"积极","sentiment_score":0.9,"quality_score":0.9}"#
            ),
            Err(AttemptError::OutOfRange { field: "rating", value: 7.0 })
        );
        assert!(matches!(
            parse_primary(
                r#"{"content":"x","rating":3,"sentiment":"中性","sentiment_score":1.4,"quality_score":0.9}"#
            ),
            Err(AttemptError::OutOfRange { field: "sentiment_score", .. })
        ));
    }

    #[test]
    fn empty_inputs_are_empty_content() {
        assert_eq!(parse_primary("   "), Err(AttemptError::EmptyContent));
        assert_eq!(
            parse_primary(r#"{"content":"  ","rating":4,"sentiment":"积极","sentiment_score":0.9,"quality_score":0.9}"#),
            Err(AttemptError::EmptyContent)
        );
        assert!(matches!(parse_primary("[1,2]"), Err(AttemptError::InvalidJson(_))));
        assert!(matches!(parse_primary("not json"), Err(AttemptError::InvalidJson(_))));
    }

    #[test]
    fn reduced_requires_lists_and_accepts_lone_strings() {
        let p = parse_reduced(
            r#"{"content":"不错","rating":"4.5","sentiment":"积极","experience":"用了一周",
                "pros":"轻薄","cons":[]}"#,
        )
        .unwrap();
        assert_eq!(p.pros, vec!["轻薄".to_string()]);
        assert!(p.cons.is_empty());
        assert_eq!(p.scores, None);

        assert_eq!(
            parse_reduced(r#"{"content":"不错","rating":4,"sentiment":"积极","experience":"好"}"#),
            Err(AttemptError::MissingField("pros"))
        );
    }
}
