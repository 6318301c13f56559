//! Diagram image loading

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MIME type used when the extension is missing or unrecognized
pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Error, Diagnostic)]
pub enum ImageError {
    #[error("Image file not found: {}", .path.display())]
    #[diagnostic(
        code(stride::image::not_found),
        help("Pass the path to an existing diagram with --image")
    )]
    NotFound { path: PathBuf },

    #[error("Failed to read image {}: {source}", .path.display())]
    #[diagnostic(code(stride::image::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A diagram read from disk, ready to embed in a model request
#[derive(Debug, Clone)]
pub struct DiagramImage {
    pub path: PathBuf,
    pub mime_type: &'static str,
    /// Standard base64 of the raw file bytes
    pub base64: String,
}

impl DiagramImage {
    /// Read and encode the image at `path`
    ///
    /// The file content is not inspected; the MIME type comes from the extension.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        if !path.exists() {
            return Err(ImageError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = bytes.len(),
            "Loaded diagram image"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime_type_for(path),
            base64: STANDARD.encode(bytes),
        })
    }

    /// `data:` URL embedding the image
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Infer an image MIME type from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => DEFAULT_MIME_TYPE,
    }
}
