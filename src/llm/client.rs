//! Model client trait and the generative-text HTTP client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::debug;

use crate::error::{excerpt, Error, Result, EXCERPT_LIMIT};

use super::types::{CompletionRequest, CompletionResponse, FinishReason, TokenUsage};

/// Client for a generative-text completion service.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a request, returning the primary textual output.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Default generative-text endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Environment variable holding the credential.
pub const CREDENTIAL_ENV: &str = "GEMINI_API_KEY";

/// Configuration for [`GenerativeClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL of the generate endpoint
    pub endpoint: String,
    /// API key, sent as the `key` query parameter
    pub credential: String,
    /// Sampling randomness (0 = deterministic)
    pub temperature: f64,
    /// Hard cap on reply length
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Honour system proxy settings
    pub use_system_proxy: bool,
}

impl ClientConfig {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential: credential.into(),
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 120,
            use_system_proxy: true,
        }
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new(lookup(CREDENTIAL_ENV).unwrap_or_default());
        Self {
            endpoint: lookup("VALIDATOR_ENDPOINT").unwrap_or(defaults.endpoint),
            temperature: lookup("VALIDATOR_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_output_tokens: lookup("VALIDATOR_MAX_OUTPUT_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_output_tokens),
            timeout_secs: lookup("VALIDATOR_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            ..defaults
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_no_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }

    /// Check the configuration, returning the parsed endpoint.
    pub fn validate(&self) -> Result<Url> {
        if self.credential.trim().is_empty() {
            return Err(Error::configuration(format!(
                "missing credential (set {})",
                CREDENTIAL_ENV
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::configuration(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(Error::configuration("max_output_tokens must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::configuration("timeout_secs must be positive"));
        }
        let url = Url::parse(&self.endpoint).map_err(|e| {
            Error::configuration(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "unsupported endpoint scheme '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("use_system_proxy", &self.use_system_proxy)
            .finish()
    }
}

fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let no_proxy = || {
        Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {}", e)))
    };

    if !config.use_system_proxy {
        return no_proxy();
    }

    // Some sandboxed macOS environments can panic during proxy auto-detection
    // in reqwest's default client builder. Fall back to no-proxy in that case.
    match catch_unwind(AssertUnwindSafe(|| Client::builder().timeout(timeout).build())) {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(_)) | Err(_) => no_proxy(),
    }
}

/// HTTP client for a Gemini-style `generateContent` endpoint.
pub struct GenerativeClient {
    config: ClientConfig,
    endpoint: Url,
    http: Client,
}

impl GenerativeClient {
    /// Create a client. Fails with a configuration error before any network
    /// activity if the credential or endpoint is unusable.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = config.validate()?;
        let http = build_http_client(&config)?;

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn timeout_error(&self) -> Error {
        Error::timeout(self.config.timeout_secs.saturating_mul(1000))
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.config.credential);
        url
    }

    fn build_request(&self, request: CompletionRequest) -> GenerateRequest {
        let contents = request
            .messages
            .into_iter()
            .map(|m| WireContent {
                role: Some(m.role.as_str().to_string()),
                parts: vec![WirePart {
                    text: Some(m.content),
                }],
            })
            .collect();

        GenerateRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: request
                    .max_output_tokens
                    .unwrap_or(self.config.max_output_tokens),
            },
        }
    }
}

// Wire types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<WireContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    usage_metadata: Option<WireUsage>,
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

/// Pull the first candidate's text out of a successful response body.
fn parse_response_body(body: &str) -> Result<CompletionResponse> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        Error::unexpected_shape(format!(
            "response is not a generate payload: {} ({})",
            e,
            excerpt(body, EXCERPT_LIMIT)
        ))
    })?;

    let Some(candidate) = response.candidates.first() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (prompt blocked: {})", r))
            .unwrap_or_default();
        return Err(Error::unexpected_shape(format!(
            "no candidates in response{}",
            reason
        )));
    };

    let texts: Vec<&str> = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if texts.is_empty() {
        return Err(Error::unexpected_shape(
            "first candidate has no text content",
        ));
    }

    let usage = response
        .usage_metadata
        .map(|u| TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: texts.concat().trim().to_string(),
        finish_reason: candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::from_wire),
        usage,
        timestamp: Utc::now(),
    })
}

#[async_trait]
impl ModelClient for GenerativeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.build_request(request);

        let response = self
            .http
            .post(self.request_url())
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error()
                } else {
                    Error::transport(format!("HTTP request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                Error::transport(format!("failed to read response: {}", e.without_url()))
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<WireError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| excerpt(&body, EXCERPT_LIMIT));
            return Err(Error::http_status(status.as_u16(), message));
        }

        let completion = parse_response_body(&body)?;
        debug!(
            chars = completion.content.len(),
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "model reply received"
        );
        Ok(completion)
    }
}
