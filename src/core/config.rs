//! Configuration management with layered hierarchy
//!
//! Priority, lowest to highest: built-in defaults, the global YAML config
//! file, environment variables (including a local `.env`), CLI flags.

use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::llm::RetryPolicy;

/// Model used when neither config nor flags name one
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI-compatible endpoint used when no override is given
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const MODEL_ENV: &str = "STRIDE_MODEL";
const API_BASE_ENV: &str = "OPENAI_BASE_URL";
const CONFIG_PATH_ENV: &str = "STRIDE_CONFIG";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("{var} environment variable is not set")]
    #[diagnostic(
        code(stride::config::missing_credential),
        help("Set it via: export OPENAI_API_KEY='your-key-here'\nOr create a .env file with: OPENAI_API_KEY=your-key-here")
    )]
    MissingCredential { var: String },

    #[error("Failed to read config file {}: {source}", .path.display())]
    #[diagnostic(code(stride::config::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {message}", .path.display())]
    #[diagnostic(
        code(stride::config::parse),
        help("Supported keys: model_name, api_base, timeout_secs, max_retries, initial_backoff_ms, max_backoff_ms")
    )]
    Parse { path: PathBuf, message: String },
}

/// Optional settings read from config files and the environment
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Model used for both the extraction and the analysis
    pub model_name: Option<String>,

    /// Base URL of the OpenAI-compatible API
    pub api_base: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// How many times a rate-limited request is retried
    pub max_retries: Option<u32>,

    /// First backoff delay, doubled on each retry
    pub initial_backoff_ms: Option<u64>,

    /// Upper bound for any single backoff delay
    pub max_backoff_ms: Option<u64>,
}

impl Config {
    /// Load configuration from the global config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (applied in `Settings::resolve`)

        // 2. Config file ($STRIDE_CONFIG, else ~/.config/stride/config.yaml)
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::global_config_path);
        if let Some(path) = path {
            if path.exists() {
                config.merge(Self::from_file(&path)?);
                tracing::debug!(path = %path.display(), "Loaded config file");
            }
        }

        // 3. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stride")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Overlay environment variables, read through `lookup`
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.model_name = Some(model);
        }
        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base = Some(base);
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.model_name.is_some() {
            self.model_name = other.model_name;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.initial_backoff_ms.is_some() {
            self.initial_backoff_ms = other.initial_backoff_ms;
        }
        if other.max_backoff_ms.is_some() {
            self.max_backoff_ms = other.max_backoff_ms;
        }
    }

    /// Apply command-line overrides, the highest priority layer
    pub fn with_overrides(mut self, overrides: Config) -> Self {
        self.merge(overrides);
        self
    }
}

/// Everything the two model exchanges need, resolved once per run
#[derive(Clone)]
pub struct Settings {
    pub model_name: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Combine the layered config with the credential
    ///
    /// Fails with [`ConfigError::MissingCredential`] when the key is absent or blank.
    pub fn resolve(config: Config, api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            })?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: config.max_retries.unwrap_or(defaults.max_retries),
            initial_backoff: config
                .initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: config
                .max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
        };

        Ok(Self {
            model_name: config.model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            retry,
        })
    }

    /// Read the credential from the environment and resolve
    pub fn from_env(config: Config) -> Result<Self, ConfigError> {
        Self::resolve(config, std::env::var(API_KEY_ENV).ok())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("model_name", &self.model_name)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
