//! Batched validation with concurrency control.
//!
//! Submissions are validated independently under a semaphore so the model
//! endpoint's rate limits are respected. One failure never aborts the batch,
//! and results come back in input order.
//!
//! # Example
//!
//! ```rust,ignore
//! use research_validator::{BatchValidator, ValidationService};
//!
//! let service = ValidationService::from_env()?;
//! let batch = BatchValidator::new(service).with_max_parallel(3);
//!
//! let results = batch.validate_all(submissions).await;
//! println!("{} of {} validated", results.success_count, results.results.len());
//! ```

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::info;

use crate::error::ErrorKind;
use crate::service::ValidationService;
use crate::submission::{Submission, ValidationReport};

/// Default maximum concurrent validations.
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Outcome of one submission in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchValidationResult {
    /// Index of the submission in the input batch.
    pub index: usize,
    /// Report (if successful).
    pub report: Option<ValidationReport>,
    /// Error kind (if failed).
    pub error_kind: Option<ErrorKind>,
    /// Error message (if failed).
    pub error: Option<String>,
}

impl BatchValidationResult {
    pub fn success(index: usize, report: ValidationReport) -> Self {
        Self {
            index,
            report: Some(report),
            error_kind: None,
            error: None,
        }
    }

    pub fn failure(index: usize, kind: ErrorKind, error: String) -> Self {
        Self {
            index,
            report: None,
            error_kind: Some(kind),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchValidationResults {
    pub results: Vec<BatchValidationResult>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BatchValidationResults {
    pub fn from_results(mut results: Vec<BatchValidationResult>) -> Self {
        results.sort_by_key(|r| r.index);

        let success_count = results.iter().filter(|r| r.is_success()).count();
        let failure_count = results.len() - success_count;

        Self {
            results,
            success_count,
            failure_count,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }

    /// Reports in input order, `None` where validation failed.
    pub fn reports(&self) -> Vec<Option<&ValidationReport>> {
        self.results.iter().map(|r| r.report.as_ref()).collect()
    }

    /// Failed indices with their error messages.
    pub fn errors(&self) -> Vec<(usize, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.index, e)))
            .collect()
    }
}

/// Runs many validations with bounded concurrency.
pub struct BatchValidator {
    service: Arc<ValidationService>,
    max_parallel: usize,
}

impl BatchValidator {
    pub fn new(service: ValidationService) -> Self {
        Self::from_arc(Arc::new(service))
    }

    pub fn from_arc(service: Arc<ValidationService>) -> Self {
        Self {
            service,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max.max(1);
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Validate every submission, at most `max_parallel` at a time.
    pub async fn validate_all(&self, submissions: Vec<Submission>) -> BatchValidationResults {
        if submissions.is_empty() {
            return BatchValidationResults::from_results(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let tasks = submissions.into_iter().enumerate().map(|(index, submission)| {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);

            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return BatchValidationResult::failure(
                        index,
                        ErrorKind::Transport,
                        "concurrency limiter closed".to_string(),
                    );
                };

                match service.validate_submission(&submission).await {
                    Ok(report) => BatchValidationResult::success(index, report),
                    Err(e) => BatchValidationResult::failure(index, e.kind(), e.to_string()),
                }
            }
        });

        let results = BatchValidationResults::from_results(join_all(tasks).await);
        info!(
            succeeded = results.success_count,
            failed = results.failure_count,
            "batch validation finished"
        );
        results
    }
}
