//! The validation pipeline: prompt → model → report.
//!
//! Each call is independent. The only suspension point is the model call,
//! which is bounded by [`ServiceConfig::request_timeout`]. Dropping the
//! returned future cancels the in-flight request.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::llm::{ClientConfig, CompletionRequest, GenerativeClient, ModelClient};
use crate::prompt::PromptBuilder;
use crate::report::ReportExtractor;
use crate::retry::RetryPolicy;
use crate::submission::{CodeArtifact, Submission, SubmissionMetadata, ValidationReport};

/// Configuration for [`ValidationService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Upper bound on a single model call.
    pub request_timeout: Duration,
    /// Retry policy; a single attempt by default.
    pub retry: RetryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            retry: RetryPolicy::none(),
        }
    }
}

impl ServiceConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Validates research submissions with a generative-text model.
pub struct ValidationService {
    client: Arc<dyn ModelClient>,
    prompts: PromptBuilder,
    extractor: ReportExtractor,
    config: ServiceConfig,
}

impl ValidationService {
    /// Create a service over any model client.
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            prompts: PromptBuilder::new(),
            extractor: ReportExtractor::new(),
            config: ServiceConfig::default(),
        }
    }

    /// Create a service backed by [`GenerativeClient`].
    pub fn from_client_config(client_config: ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(client_config.timeout_secs);
        let client = GenerativeClient::new(client_config)?;
        Ok(Self::new(Arc::new(client))
            .with_config(ServiceConfig::default().with_request_timeout(timeout)))
    }

    /// Create a service from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::from_client_config(ClientConfig::from_env())
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_extractor(mut self, extractor: ReportExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Assess a submission.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), title = %metadata.title))]
    pub async fn validate(
        &self,
        metadata: &SubmissionMetadata,
        code: &CodeArtifact,
    ) -> Result<ValidationReport> {
        let prompt = self.prompts.build(metadata, code);
        debug!(prompt_chars = prompt.len(), code_chars = code.char_len(), "prompt built");

        let mut attempt = 1;
        loop {
            match self.attempt(&prompt).await {
                Ok(report) => {
                    info!(
                        score = report.score,
                        limitations = report.limitations.len(),
                        suggestions = report.suggestions.len(),
                        attempt,
                        "submission validated"
                    );
                    return Ok(report);
                }
                Err(e) if self.config.retry.should_retry(attempt, &e) => {
                    let delay = self.config.retry.backoff(attempt);
                    warn!(
                        kind = %e.kind(),
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "validation attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(kind = %e.kind(), error = %e, attempt, "validation failed");
                    return Err(e);
                }
            }
        }
    }

    /// Assess a metadata + code pair.
    pub async fn validate_submission(&self, submission: &Submission) -> Result<ValidationReport> {
        self.validate(&submission.metadata, &submission.code).await
    }

    async fn attempt(&self, prompt: &str) -> Result<ValidationReport> {
        let request = CompletionRequest::from_prompt(prompt);
        let timeout = self.config.request_timeout;

        let response = tokio::time::timeout(timeout, self.client.complete(request))
            .await
            .map_err(|_| Error::timeout(timeout.as_millis() as u64))??;

        self.extractor.extract(&response.content)
    }
}
