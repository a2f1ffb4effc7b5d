//! CLI-facing validation helpers.
//!
//! A deterministic command surface that a thin binary wrapper can call to
//! validate a submission file and print the report.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::service::ValidationService;
use crate::submission::{Submission, ValidationReport};

/// Submission file used when no path is given.
pub const DEFAULT_SUBMISSION_PATH: &str = "submissions/sample_submission.json";

/// Read a submission file of the form `{"metadata": {...}, "code": "..."}`.
///
/// A missing `code` field is treated as an empty artifact.
pub fn load_submission(path: impl AsRef<Path>) -> Result<Submission> {
    let path = path.as_ref();
    let payload = fs::read_to_string(path)?;
    serde_json::from_str(&payload).map_err(|error| {
        Error::InvalidSubmission(format!(
            "invalid submission file '{}': {}",
            path.display(),
            error
        ))
    })
}

/// Render a report as human-readable text.
pub fn render_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reproducibility score: {}/{}", report.score, ValidationReport::MAX_SCORE);

    let _ = writeln!(out, "\nLimitations:");
    for (i, item) in report.limitations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, item);
    }

    let _ = writeln!(out, "\nSuggestions:");
    for (i, item) in report.suggestions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, item);
    }
    out
}

/// Load the submission at `path` and validate it.
pub async fn run_validation(
    service: &ValidationService,
    path: impl AsRef<Path>,
) -> Result<ValidationReport> {
    let submission = load_submission(path)?;
    service.validate_submission(&submission).await
}
