//! Threat model report generation

pub mod markdown;
pub mod tally;

use miette::Diagnostic;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use markdown::render_report;
pub use tally::ThreatTally;

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("Failed to write report to {}", .path.display())]
    #[diagnostic(
        code(stride::report::write),
        help("Check that the output directory exists and is writable")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write rendered report text to `path`, replacing any existing file
pub fn write_report(path: &Path, content: &str) -> Result<(), ReportError> {
    let to_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes()).map_err(to_error)?;
    writer.flush().map_err(to_error)?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote report");
    Ok(())
}
