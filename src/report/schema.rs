//! Shape checks for the report object returned by the model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::submission::ValidationReport;

/// JSON key carrying the score.
pub const SCORE_FIELD: &str = "reproducibility_score";
/// JSON key carrying the limitations list.
pub const LIMITATIONS_FIELD: &str = "limitations";
/// JSON key carrying the suggestions list.
pub const SUGGESTIONS_FIELD: &str = "suggestions";

/// Why a parsed reply does not have the report shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum SchemaViolation {
    /// The top-level value is not an object.
    NotAnObject { got: String },

    /// A required field is absent.
    MissingField { field: String, expected: String },

    /// A field (or list element) has the wrong JSON type.
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
        /// Preview of the actual value (first 100 chars)
        value_preview: String,
    },

    /// A list has no usable entries.
    EmptyList { field: String },
}

impl SchemaViolation {
    pub fn missing_field(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, value: &Value) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            got: value_type_name(value).to_string(),
            value_preview: crate::error::excerpt(&value.to_string(), 100),
        }
    }

    /// The offending field, `<root>` for a non-object reply.
    pub fn field(&self) -> &str {
        match self {
            Self::NotAnObject { .. } => "<root>",
            Self::MissingField { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::EmptyList { field } => field,
        }
    }

    pub fn to_user_message(&self) -> String {
        match self {
            Self::NotAnObject { got } => format!("expected a JSON object, got {}", got),
            Self::MissingField { field, expected } => {
                format!("missing required field '{}' (expected {})", field, expected)
            }
            Self::TypeMismatch {
                field,
                expected,
                got,
                value_preview,
            } => format!(
                "field '{}' has wrong type: expected {}, got {} (value: {})",
                field, expected, got, value_preview
            ),
            Self::EmptyList { field } => format!("field '{}' has no non-empty entries", field),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_message())
    }
}

impl std::error::Error for SchemaViolation {}

/// A report that passed the shape checks, with notes on what was repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedReport {
    pub report: ValidationReport,
    /// The raw score before rounding and clamping.
    pub raw_score: f64,
    /// Blank list entries that were dropped.
    pub dropped_entries: usize,
}

impl CheckedReport {
    pub fn score_was_clamped(&self) -> bool {
        let rounded = self.raw_score.round();
        rounded < 0.0 || rounded > f64::from(ValidationReport::MAX_SCORE)
    }
}

/// Check a parsed reply against the report shape.
pub fn check_report(value: &Value) -> Result<CheckedReport, SchemaViolation> {
    let obj = value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
        got: value_type_name(value).to_string(),
    })?;

    let raw_score = read_score(obj)?;
    let (limitations, dropped_limitations) = read_string_list(obj, LIMITATIONS_FIELD)?;
    let (suggestions, dropped_suggestions) = read_string_list(obj, SUGGESTIONS_FIELD)?;

    Ok(CheckedReport {
        report: ValidationReport {
            score: clamp_score(raw_score),
            limitations,
            suggestions,
        },
        raw_score,
        dropped_entries: dropped_limitations + dropped_suggestions,
    })
}

fn read_score(obj: &Map<String, Value>) -> Result<f64, SchemaViolation> {
    let value = obj
        .get(SCORE_FIELD)
        .ok_or_else(|| SchemaViolation::missing_field(SCORE_FIELD, "number"))?;
    value
        .as_f64()
        .ok_or_else(|| SchemaViolation::type_mismatch(SCORE_FIELD, "number", value))
}

/// Round to the nearest integer and clamp into `0..=100`.
pub fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, f64::from(ValidationReport::MAX_SCORE)) as u8
}

fn read_string_list(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<(Vec<String>, usize), SchemaViolation> {
    let value = obj
        .get(field)
        .ok_or_else(|| SchemaViolation::missing_field(field, "array of strings"))?;
    let items = value
        .as_array()
        .ok_or_else(|| SchemaViolation::type_mismatch(field, "array of strings", value))?;

    let mut entries = Vec::with_capacity(items.len());
    let mut dropped = 0;
    for (idx, item) in items.iter().enumerate() {
        let text = item.as_str().ok_or_else(|| {
            SchemaViolation::type_mismatch(format!("{}[{}]", field, idx), "string", item)
        })?;
        if text.trim().is_empty() {
            dropped += 1;
        } else {
            entries.push(text.to_string());
        }
    }

    if entries.is_empty() {
        return Err(SchemaViolation::EmptyList {
            field: field.to_string(),
        });
    }
    Ok((entries, dropped))
}

/// Get a human-readable type name for a JSON value.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_check_valid_report() {
        let value = json!({
            "reproducibility_score": 64,
            "limitations": ["a", "b"],
            "suggestions": ["c"]
        });
        let checked = check_report(&value).unwrap();

        assert_eq!(
            checked.report,
            ValidationReport {
                score: 64,
                limitations: vec!["a".to_string(), "b".to_string()],
                suggestions: vec!["c".to_string()],
            }
        );
        assert_eq!(checked.dropped_entries, 0);
        assert!(!checked.score_was_clamped());
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(150.0), 100);
        assert_eq!(clamp_score(-3.0), 0);
        assert_eq!(clamp_score(72.4), 72);
        assert_eq!(clamp_score(72.5), 73);
        assert_eq!(clamp_score(100.4), 100);
    }

    #[test]
    fn test_fractional_score_rounds() {
        let value = json!({"reproducibility_score": 87.6, "limitations": ["a"], "suggestions": ["b"]});
        let checked = check_report(&value).unwrap();
        assert_eq!(checked.report.score, 88);
        assert_eq!(checked.raw_score, 87.6);
    }

    #[test]
    fn test_missing_suggestions() {
        let value = json!({"reproducibility_score": 80, "limitations": []});
        let err = check_report(&value).unwrap_err();

        // Empty limitations is reported first since fields are read in order.
        assert_eq!(err.field(), "limitations");

        let value = json!({"reproducibility_score": 80, "limitations": ["a"]});
        let err = check_report(&value).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::missing_field("suggestions", "array of strings")
        );
    }

    #[test]
    fn test_score_must_be_numeric() {
        let value = json!({"reproducibility_score": "80", "limitations": ["a"], "suggestions": ["b"]});
        let err = check_report(&value).unwrap_err();

        match err {
            SchemaViolation::TypeMismatch { field, got, .. } => {
                assert_eq!(field, "reproducibility_score");
                assert_eq!(got, "string");
            }
            other => panic!("unexpected violation: {other:?}"),
        }
    }

    #[test]
    fn test_list_elements_must_be_strings() {
        let value = json!({"reproducibility_score": 1, "limitations": ["a", 2], "suggestions": ["b"]});
        let err = check_report(&value).unwrap_err();
        assert_eq!(err.field(), "limitations[1]");
        assert!(err.to_user_message().contains("expected string, got integer"));
    }

    #[test]
    fn test_list_must_be_array() {
        let value = json!({"reproducibility_score": 1, "limitations": "a", "suggestions": ["b"]});
        let err = check_report(&value).unwrap_err();
        assert!(matches!(err, SchemaViolation::TypeMismatch { ref field, .. } if field == "limitations"));
    }

    #[test]
    fn test_blank_entries_dropped() {
        let value = json!({
            "reproducibility_score": 50,
            "limitations": ["", "real", "   "],
            "suggestions": ["b"]
        });
        let checked = check_report(&value).unwrap();
        assert_eq!(checked.report.limitations, vec!["real".to_string()]);
        assert_eq!(checked.dropped_entries, 2);

        let value = json!({"reproducibility_score": 50, "limitations": [" "], "suggestions": ["b"]});
        assert_eq!(
            check_report(&value).unwrap_err(),
            SchemaViolation::EmptyList {
                field: "limitations".to_string()
            }
        );
    }

    #[test]
    fn test_not_an_object() {
        let err = check_report(&json!([1, 2])).unwrap_err();
        assert_eq!(err.field(), "<root>");
        assert_eq!(err.to_user_message(), "expected a JSON object, got array");
    }

    #[test]
    fn test_violation_serialization() {
        let violation = SchemaViolation::missing_field("suggestions", "array of strings");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["violation"], "missing_field");
        assert_eq!(json["field"], "suggestions");
    }
}
