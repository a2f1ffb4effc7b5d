//! Submission inputs and the validation report.

use serde::{Deserialize, Serialize};

/// Descriptive metadata of a research submission.
///
/// Collected by an outer component; only presence of the fields is assumed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
}

impl SubmissionMetadata {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            description: description.into(),
        }
    }
}

/// Source code accompanying a submission. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeArtifact(String);

impl CodeArtifact {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for CodeArtifact {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for CodeArtifact {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl AsRef<str> for CodeArtifact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A metadata + code pair being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub metadata: SubmissionMetadata,
    #[serde(default)]
    pub code: CodeArtifact,
}

impl Submission {
    pub fn new(metadata: SubmissionMetadata, code: impl Into<CodeArtifact>) -> Self {
        Self {
            metadata,
            code: code.into(),
        }
    }
}

/// Structured quality assessment of a submission.
///
/// `score` is always within `0..=100`; both lists are non-empty and contain no
/// blank entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub score: u8,
    pub limitations: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    /// Upper bound of the reproducibility score.
    pub const MAX_SCORE: u8 = 100;
}
