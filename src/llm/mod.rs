//! Model provider boundary
//!
//! Everything that talks to, or interprets text from, the language model:
//! the chat client, prompt templates, the rate-limit retry policy and the
//! tolerant JSON parser for replies.

pub mod client;
pub mod error;
pub mod parse;
pub mod prompts;
pub mod retry;

pub use client::{ChatModel, ChatRequest, ContentPart, OpenAiClient};
pub use error::LlmError;
pub use parse::{parse_loose_json, strip_code_fence, ResponseParseError};
pub use prompts::{PromptError, Prompts};
pub use retry::RetryPolicy;

/// Which of the two model exchanges a request or reply belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    ComponentExtraction,
    ThreatAnalysis,
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::ComponentExtraction => write!(f, "component extraction"),
            Exchange::ThreatAnalysis => write!(f, "threat analysis"),
        }
    }
}
