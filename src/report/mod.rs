//! Extraction of a structured report from free-form model output.
//!
//! The model is asked for a bare JSON object but may wrap it in prose or code
//! fences. Extraction locates the object with a brace-depth scan, parses it,
//! and checks its shape:
//!
//! 1. No `{...}` span → [`Error::NoJsonFound`]
//! 2. Span is not JSON → [`Error::JsonParse`]
//! 3. Wrong shape → [`Error::SchemaValidation`]
//!
//! Scores are rounded and clamped into `0..=100` rather than rejected. Lists
//! shorter than the requested minimum are logged, not rejected.

mod scan;
mod schema;

pub use scan::{find_json_span, greedy_json_span, json_object_spans, JsonSpans};
pub use schema::{
    check_report, clamp_score, CheckedReport, SchemaViolation, LIMITATIONS_FIELD, SCORE_FIELD,
    SUGGESTIONS_FIELD,
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::prompt::REQUESTED_MIN_ENTRIES;
use crate::submission::ValidationReport;

/// Configuration for report extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Lists shorter than this are logged as under-delivered.
    pub advisory_min_entries: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            advisory_min_entries: REQUESTED_MIN_ENTRIES,
        }
    }
}

/// Extracts a [`ValidationReport`] from raw model text.
#[derive(Debug, Clone, Default)]
pub struct ReportExtractor {
    config: ExtractionConfig,
}

impl ReportExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Locate, parse and check the report in `raw`.
    pub fn extract(&self, raw: &str) -> Result<ValidationReport> {
        let value = locate_and_parse(raw)?;
        let checked = check_report(&value)?;

        if checked.score_was_clamped() {
            warn!(
                raw_score = checked.raw_score,
                score = checked.report.score,
                "score clamped into range"
            );
        }
        if checked.dropped_entries > 0 {
            debug!(dropped = checked.dropped_entries, "dropped blank report entries");
        }
        self.check_advisory_counts(&checked.report);

        Ok(checked.report)
    }

    fn check_advisory_counts(&self, report: &ValidationReport) {
        let min = self.config.advisory_min_entries;
        if report.limitations.len() < min {
            warn!(
                count = report.limitations.len(),
                requested = min,
                "model returned fewer limitations than requested"
            );
        }
        if report.suggestions.len() < min {
            warn!(
                count = report.suggestions.len(),
                requested = min,
                "model returned fewer suggestions than requested"
            );
        }
    }
}

/// Extract with the default configuration.
pub fn extract_report(raw: &str) -> Result<ValidationReport> {
    ReportExtractor::new().extract(raw)
}

/// Find the JSON object in `raw` and parse it.
///
/// Balanced spans are tried in order and the first one that parses and carries
/// a report key wins. Otherwise the greedy first-`{`-to-last-`}` span is parsed,
/// so a reply without report keys still gets a shape check and a truncated
/// reply surfaces as a parse error.
fn locate_and_parse(raw: &str) -> Result<Value> {
    let keyed = json_object_spans(raw)
        .filter_map(|span| serde_json::from_str::<Value>(span).ok())
        .find(has_report_key);
    if let Some(value) = keyed {
        return Ok(value);
    }

    match greedy_json_span(raw) {
        Some(span) => serde_json::from_str(span).map_err(|e| Error::json_parse(e, raw)),
        None => Err(Error::no_json_found(raw)),
    }
}

fn has_report_key(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        [SCORE_FIELD, LIMITATIONS_FIELD, SUGGESTIONS_FIELD]
            .iter()
            .any(|key| obj.contains_key(*key))
    })
}
