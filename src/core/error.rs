//! Top-level error for a threat modeling run

use miette::Diagnostic;
use thiserror::Error;

use super::config::ConfigError;
use super::image::ImageError;
use crate::analysis::AnalysisError;
use crate::llm::{LlmError, PromptError};
use crate::report::ReportError;

/// Any failure that aborts a run
#[derive(Debug, Error, Diagnostic)]
pub enum StrideError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Report(#[from] ReportError),
}

pub type Result<T> = std::result::Result<T, StrideError>;
