//! Framework-agnostic handler for a `POST /api/validate` route.
//!
//! The handler takes the raw request body and returns a status code plus a
//! JSON body, so any HTTP server can mount it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::error::{Error, ErrorKind};
use crate::service::ValidationService;
use crate::submission::{CodeArtifact, SubmissionMetadata, ValidationReport};

/// Request body for the validate route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub metadata: SubmissionMetadata,
    #[serde(default)]
    pub code: CodeArtifact,
}

/// Success body for the validate route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub score: u8,
    pub limitations: Vec<String>,
    pub suggestions: Vec<String>,
}

impl From<ValidationReport> for ValidateResponse {
    fn from(report: ValidationReport) -> Self {
        Self {
            score: report.score,
            limitations: report.limitations,
            suggestions: report.suggestions,
        }
    }
}

/// Status code and JSON body to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn failure(status: u16, kind: ErrorKind, message: String) -> Self {
        Self {
            status,
            body: json!({
                "error": "Failed to run validation",
                "kind": kind,
                "message": message,
            }),
        }
    }
}

/// Handle a validate request body.
pub async fn handle_validate(service: &ValidationService, body: &str) -> HttpResponse {
    let request: ValidateRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::failure(
                400,
                ErrorKind::InvalidSubmission,
                format!("invalid request body: {}", e),
            )
        }
    };

    match service.validate(&request.metadata, &request.code).await {
        Ok(report) => HttpResponse::ok(json!(ValidateResponse::from(report))),
        Err(e) => {
            error!(kind = %e.kind(), error = %e, "validation request failed");
            HttpResponse::failure(status_for(&e), e.kind(), e.to_string())
        }
    }
}

/// HTTP status for a failed validation.
fn status_for(error: &Error) -> u16 {
    match error.kind() {
        ErrorKind::InvalidSubmission => 400,
        ErrorKind::Configuration | ErrorKind::Io => 500,
        ErrorKind::Transport
        | ErrorKind::UnexpectedResponseShape
        | ErrorKind::NoJsonFound
        | ErrorKind::JsonParse
        | ErrorKind::SchemaValidation => 502,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{report_reply, ScriptedClient};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const BODY: &str = r#"{
        "metadata": {"title": "T", "author": "A", "description": "D"},
        "code": "x = 1"
    }"#;

    fn service(reply: crate::error::Result<String>) -> ValidationService {
        ValidationService::new(Arc::new(ScriptedClient::new(vec![reply])))
    }

    #[tokio::test]
    async fn test_success_body() {
        let response = handle_validate(&service(Ok(report_reply(81))), BODY).await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({
                "score": 81,
                "limitations": ["No random seed", "No pinned versions"],
                "suggestions": ["Publish a lockfile"],
            })
        );
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let response = handle_validate(&service(Ok(report_reply(81))), "{not json").await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body["kind"], "invalid_submission");
    }

    #[tokio::test]
    async fn test_configuration_error_is_500() {
        let response =
            handle_validate(&service(Err(Error::configuration("missing key"))), BODY).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Failed to run validation");
        assert_eq!(response.body["kind"], "configuration");
    }

    #[tokio::test]
    async fn test_model_output_error_is_502() {
        let response = handle_validate(&service(Ok("no report today".to_string())), BODY).await;

        assert_eq!(response.status, 502);
        assert_eq!(response.body["kind"], "no_json_found");

        let response =
            handle_validate(&service(Err(Error::http_status(429, "quota"))), BODY).await;
        assert_eq!(response.status, 502);
        assert_eq!(response.body["kind"], "transport");
    }

    #[tokio::test]
    async fn test_missing_code_defaults_to_empty() {
        let client = Arc::new(ScriptedClient::replying(report_reply(40)));
        let service = ValidationService::new(client.clone());

        let response = handle_validate(
            &service,
            r#"{"metadata": {"title": "T", "author": "A", "description": "D"}}"#,
        )
        .await;

        assert_eq!(response.status, 200);
        assert_eq!(client.prompts().len(), 1);
    }
}
