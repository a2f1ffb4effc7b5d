//! Generative-text model access.
//!
//! [`ModelClient`] is the seam the validation service talks to; [`GenerativeClient`]
//! is the HTTP implementation for a `generateContent`-style endpoint. Tests and
//! hosts can substitute their own implementation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_validator::llm::{ClientConfig, CompletionRequest, GenerativeClient, ModelClient};
//!
//! let client = GenerativeClient::new(ClientConfig::from_env())?;
//! let response = client.complete(CompletionRequest::from_prompt("Hello")).await?;
//! println!("{}", response.content);
//! ```

mod client;
mod types;

pub use client::{ClientConfig, GenerativeClient, ModelClient, CREDENTIAL_ENV, DEFAULT_ENDPOINT};
pub use types::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, FinishReason, TokenUsage,
};
