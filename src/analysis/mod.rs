//! The two model-driven stages of a threat modeling run
//!
//! [`extract_components`] reads the diagram; [`analyze_threats`] runs the
//! STRIDE analysis over what was extracted. Both take any [`ChatModel`], so
//! they can be driven by a scripted model in tests.
//!
//! [`ChatModel`]: crate::llm::ChatModel

mod analyzer;
mod extractor;

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::llm::{parse_loose_json, Exchange, LlmError, PromptError, ResponseParseError};

pub use analyzer::analyze_threats;
pub use extractor::extract_components;

/// Errors from either model exchange
#[derive(Debug, Error, Diagnostic)]
pub enum AnalysisError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ResponseParseError),
}

/// Read a model reply as `T`, tagging any failure with its exchange
fn parse_reply<T: DeserializeOwned>(reply: &str, exchange: Exchange) -> Result<T, AnalysisError> {
    parse_loose_json(reply).map_err(|e| {
        let e = e.during(exchange);
        tracing::debug!(
            exchange = %exchange,
            offset = e.offset(),
            reply_length = e.response_text().len(),
            "Model reply could not be parsed"
        );
        AnalysisError::Parse(e)
    })
}
