//! # research-validator
//!
//! Reproducibility assessment of research submissions with a generative-text
//! model.
//!
//! ## Core Components
//!
//! - **Prompt**: Builds the assessment prompt from metadata and code
//! - **LLM**: The model client seam and an HTTP `generateContent` client
//! - **Report**: Locates, parses and checks the JSON report in a model reply
//! - **Service**: The end-to-end pipeline with timeout and optional retry
//! - **Batch**: Many submissions under a concurrency limit
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_validator::{CodeArtifact, SubmissionMetadata, ValidationService};
//!
//! let service = ValidationService::from_env()?;
//! let metadata = SubmissionMetadata::new("Sparse attention", "A. Author", "LRA benchmarks");
//!
//! let report = service.validate(&metadata, &CodeArtifact::new("import torch")).await?;
//! println!("score: {}", report.score);
//! ```

pub mod adapters;
pub mod batch;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod retry;
pub mod service;
pub mod submission;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use batch::{BatchValidationResult, BatchValidationResults, BatchValidator};
pub use error::{Error, ErrorKind, Result};
pub use llm::{ClientConfig, CompletionRequest, CompletionResponse, GenerativeClient, ModelClient};
pub use prompt::{build_prompt, PromptBuilder, PromptConfig};
pub use report::{extract_report, ExtractionConfig, ReportExtractor, SchemaViolation};
pub use retry::RetryPolicy;
pub use service::{ServiceConfig, ValidationService};
pub use submission::{CodeArtifact, Submission, SubmissionMetadata, ValidationReport};
