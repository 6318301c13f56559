//! Core module - configuration, diagram input and the top-level error

pub mod config;
pub mod error;
pub mod image;

pub use config::{Config, ConfigError, Settings};
pub use error::{Result, StrideError};
pub use image::{DiagramImage, ImageError};
