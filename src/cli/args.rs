//! CLI argument definitions using clap derive

use clap::Parser;
use std::path::PathBuf;

use crate::core::config::Config;

#[derive(Parser, Debug)]
#[command(name = "stride")]
#[command(author, version, about = "STRIDE threat modeling from architecture diagrams")]
#[command(long_about = "Reads an architecture diagram image, asks a vision-capable model to \
    identify its components and data flows, runs a STRIDE threat analysis over them and \
    writes the result as a Markdown report.")]
pub struct Cli {
    /// Architecture diagram image (png, jpg, jpeg, gif, webp, bmp)
    #[arg(long, short = 'i')]
    pub image: PathBuf,

    /// Where to write the Markdown report
    #[arg(long, short = 'o', default_value = "stride_report.md")]
    pub output: PathBuf,

    /// Model used for both analysis steps [default: gpt-4o] [env: STRIDE_MODEL]
    #[arg(long)]
    pub model_name: Option<String>,

    /// Base URL of an OpenAI-compatible API [env: OPENAI_BASE_URL]
    #[arg(long)]
    pub api_base: Option<String>,

    /// Retries after a rate-limit response before giving up
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Suppress progress output
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Flags as the highest-priority config layer
    ///
    /// Blank values are ignored so they cannot mask lower layers.
    pub fn config_overrides(&self) -> Config {
        let non_blank = |v: &Option<String>| v.clone().filter(|v| !v.trim().is_empty());
        Config {
            model_name: non_blank(&self.model_name),
            api_base: non_blank(&self.api_base),
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}
