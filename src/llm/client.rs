//! Chat completion client for OpenAI-compatible providers

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{Exchange, LlmError, RetryPolicy};
use crate::core::config::Settings;

/// Sampling temperature for both exchanges
const TEMPERATURE: f32 = 0.2;

/// One piece of a multimodal user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image given as a URL, typically a `data:` URL
    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// A single-turn request to the model
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub exchange: Exchange,
    pub parts: Vec<ContentPart>,
}

impl ChatRequest {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Total characters of text content, for logging
    pub fn prompt_length(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                ContentPart::Text { text } => text.len(),
                ContentPart::ImageUrl { .. } => 0,
            })
            .sum()
    }
}

/// A model that answers a chat request with text
pub trait ChatModel {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a [ContentPart],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for the Chat Completions API
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Create a client from resolved settings
    pub fn new(settings: &Settings) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("stride/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", settings.api_base.trim_end_matches('/'));

        tracing::info!(model = %settings.model_name, endpoint = %endpoint, "Model client initialized");

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model_name.clone(),
            retry: settings.retry,
        })
    }

    fn send_once(&self, body: &CompletionBody<'_>, request: &ChatRequest, attempt: u32) -> Result<String, LlmError> {
        let start_time = Instant::now();

        tracing::debug!(
            exchange = %request.exchange,
            model = %self.model,
            attempt,
            prompt_length = request.prompt_length(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| LlmError::Transport {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(
                exchange = %request.exchange,
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Chat completion request failed"
            );
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| LlmError::Envelope(e.to_string()))?;

        tracing::info!(
            exchange = %request.exchange,
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Chat completion request completed"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyReply)
    }
}

impl ChatModel for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = CompletionBody {
            model: &self.model,
            temperature: TEMPERATURE,
            messages: [Message {
                role: "user",
                content: &request.parts,
            }],
        };

        self.retry
            .run(|attempt| self.send_once(&body, request, attempt))
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Read the provider's requested delay from `retry-after-ms` or `retry-after`
///
/// Only the delta-seconds form of `Retry-After` is understood. Values too
/// large for a `Duration` saturate; the retry policy caps them.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    }

    if let Some(ms) = header(headers, "retry-after-ms").and_then(|v| v.parse::<u64>().ok()) {
        return Some(Duration::from_millis(ms));
    }

    header(headers, "retry-after")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}
