//! Tolerant JSON extraction from free-form model replies

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::Exchange;

/// A model reply that could not be read as the requested JSON document
#[derive(Debug, Error, Diagnostic)]
#[error(
    "Could not parse {} response as JSON: {message}",
    .exchange.map_or_else(|| "model".to_string(), |e| e.to_string())
)]
#[diagnostic(
    code(stride::llm::parse),
    help("The model did not follow the requested JSON shape; running again usually helps")
)]
pub struct ResponseParseError {
    #[source_code]
    src: NamedSource<String>,

    #[label("parsing stopped here")]
    span: SourceSpan,

    exchange: Option<Exchange>,

    /// The underlying serde_json message
    message: String,
}

impl ResponseParseError {
    /// Build from a serde_json error raised while parsing `window`, which
    /// starts at byte `window_start` of `source`
    fn from_serde_error(
        err: &serde_json::Error,
        source: &str,
        window_start: usize,
        window: &str,
    ) -> Self {
        let offset = window_start + line_col_to_offset(window, err.line(), err.column());
        Self::at_offset(err.to_string(), source, offset)
    }

    fn at_offset(message: String, source: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(source, offset.min(source.len()));
        let len = source[offset..].chars().next().map_or(0, char::len_utf8);

        Self {
            src: NamedSource::new("model response", source.to_string()),
            span: SourceSpan::from((offset, len)),
            exchange: None,
            message,
        }
    }

    /// Record which exchange produced the reply
    pub fn during(mut self, exchange: Exchange) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn exchange(&self) -> Option<Exchange> {
        self.exchange
    }

    /// Byte offset into the (fence-stripped) reply where parsing failed
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    /// The fence-stripped reply text that failed to parse
    pub fn response_text(&self) -> &str {
        self.src.inner()
    }
}

/// Remove a surrounding markdown code fence, if any
///
/// The opening fence line (with any language tag) is dropped, as is a
/// closing fence at the very end.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply as JSON, repairing what can be repaired
///
/// 1. Strip a markdown code fence.
/// 2. Parse the whole text strictly.
/// 3. Otherwise parse the span from the first `{` to the last `}`.
///
/// Fails when neither attempt yields a `T`.
pub fn parse_loose_json<T: DeserializeOwned>(text: &str) -> Result<T, ResponseParseError> {
    let body = strip_code_fence(text);

    let strict_err = match serde_json::from_str::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    tracing::warn!(error = %strict_err, "Model response was not valid JSON, attempting repair");

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            let window = &body[start..=end];
            serde_json::from_str::<T>(window)
                .map_err(|e| ResponseParseError::from_serde_error(&e, body, start, window))
        }
        _ => Err(ResponseParseError::from_serde_error(&strict_err, body, 0, body)),
    }
}

/// Convert a 1-based line and column to a byte offset within `source`
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    if line <= 1 {
        return column.saturating_sub(1).min(source.len());
    }

    let line_start = source
        .match_indices('\n')
        .nth(line - 2)
        .map_or(source.len(), |(i, _)| i + 1);

    (line_start + column.saturating_sub(1)).min(source.len())
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
