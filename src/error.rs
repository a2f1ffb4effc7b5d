//! Error types for research-validator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::SchemaViolation;

/// Result type alias using research-validator's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters of raw model output carried in a diagnostic.
pub const EXCERPT_LIMIT: usize = 500;

/// Errors that can occur while validating a submission.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid credential or endpoint configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout, or non-success HTTP status
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Endpoint replied, but without the expected candidate text
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    /// Model reply contains no `{...}` span
    #[error("No JSON object found in model reply: {excerpt}")]
    NoJsonFound { excerpt: String },

    /// The located span is not valid JSON
    #[error("Failed to parse model reply as JSON: {source} (reply: {excerpt})")]
    JsonParse {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    /// Parsed JSON does not match the report shape
    #[error("Schema validation failed: {0}")]
    SchemaValidation(SchemaViolation),

    /// Submission input could not be read or decoded
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of [`Error`], for logging and wire responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    UnexpectedResponseShape,
    NoJsonFound,
    JsonParse,
    SchemaValidation,
    InvalidSubmission,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::UnexpectedResponseShape => "unexpected_response_shape",
            Self::NoJsonFound => "no_json_found",
            Self::JsonParse => "json_parse",
            Self::SchemaValidation => "schema_validation",
            Self::InvalidSubmission => "invalid_submission",
            Self::Io => "io",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a transport error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a transport error for an elapsed timeout.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::transport(format!("request timed out after {}ms", duration_ms))
    }

    /// Create an unexpected response shape error.
    pub fn unexpected_shape(message: impl Into<String>) -> Self {
        Self::UnexpectedResponseShape(message.into())
    }

    /// Create a no-JSON error carrying a truncated copy of the reply.
    pub fn no_json_found(raw: &str) -> Self {
        Self::NoJsonFound {
            excerpt: excerpt(raw, EXCERPT_LIMIT),
        }
    }

    /// Create a JSON parse error carrying a truncated copy of the reply.
    pub fn json_parse(source: serde_json::Error, raw: &str) -> Self {
        Self::JsonParse {
            source,
            excerpt: excerpt(raw, EXCERPT_LIMIT),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UnexpectedResponseShape(_) => ErrorKind::UnexpectedResponseShape,
            Self::NoJsonFound { .. } => ErrorKind::NoJsonFound,
            Self::JsonParse { .. } => ErrorKind::JsonParse,
            Self::SchemaValidation(_) => ErrorKind::SchemaValidation,
            Self::InvalidSubmission(_) => ErrorKind::InvalidSubmission,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether a caller may reasonably retry (or re-prompt) after this error.
    ///
    /// Configuration and input errors are fatal until fixed; every other kind
    /// stems from the network or from the model not following instructions.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::InvalidSubmission | ErrorKind::Io
        )
    }
}

impl From<SchemaViolation> for Error {
    fn from(violation: SchemaViolation) -> Self {
        Self::SchemaValidation(violation)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Truncate text to at most `max_chars` characters, marking the cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}
