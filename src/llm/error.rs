//! Error types for model provider calls

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the model provider
#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    /// Failed to build the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    #[diagnostic(code(stride::llm::client))]
    Client(String),

    /// The request never produced an HTTP response
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(
        code(stride::llm::transport),
        help("Check network connectivity and the --api-base setting")
    )]
    Transport { url: String, message: String },

    /// Provider answered 429
    #[error("Rate limited by the model provider{}", .retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    #[diagnostic(
        code(stride::llm::rate_limited),
        help("Wait a moment and run again, or raise --max-retries")
    )]
    RateLimited { retry_after: Option<Duration> },

    /// Provider rejected the credential
    #[error("Model provider rejected the credential (HTTP {status})")]
    #[diagnostic(
        code(stride::llm::unauthorized),
        help("Check that OPENAI_API_KEY holds a valid key")
    )]
    Unauthorized { status: u16 },

    /// Any other non-success status
    #[error("Model provider returned HTTP {status}: {body}")]
    #[diagnostic(code(stride::llm::status))]
    Status { status: u16, body: String },

    /// The response body was not a chat completion
    #[error("Malformed response from model provider: {0}")]
    #[diagnostic(code(stride::llm::envelope))]
    Envelope(String),

    /// The completion carried no text
    #[error("Model returned an empty reply")]
    #[diagnostic(code(stride::llm::empty_reply))]
    EmptyReply,
}

impl LlmError {
    /// Check if error is retryable
    ///
    /// Only provider rate-limit signals are retried; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Delay requested by the provider, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
