//! Process configuration assembled from environment variables.
//!
//! # Responsibility
//! - Read storage, logging and text-analysis settings once at process start.
//! - Decide whether the configured credential enables the capability.
//!
//! # Invariants
//! - A missing, blank or placeholder credential disables the capability; it
//!   is never an error.
//! - Malformed numeric settings are rejected instead of silently defaulted.

use crate::logging::default_log_level;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SMARTTODO_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SMARTTODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SMARTTODO_LOG_DIR";
pub const ENV_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_MODEL: &str = "GROQ_MODEL";
pub const ENV_BASE_URL: &str = "GROQ_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SMARTTODO_AI_TIMEOUT_SECS";

/// Sample value shipped in env templates; treated as "no credential".
pub const PLACEHOLDER_API_KEY: &str = "replace_with_your_groq_api_key";
pub const DEFAULT_DB_PATH: &str = "smarttodo.sqlite3";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings for the external text-analysis capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CapabilityConfig {
    /// Returns the credential only when it can plausibly authenticate.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; file logging is off when unset.
    pub log_dir: Option<String>,
    pub capability: CapabilityConfig,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_secs = match non_blank(ENV_TIMEOUT_SECS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_TIMEOUT_SECS,
                        value: raw,
                        reason: "expected a positive integer number of seconds",
                    });
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            db_path: non_blank(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: non_blank(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(ENV_LOG_DIR),
            capability: CapabilityConfig {
                api_key: lookup(ENV_API_KEY),
                model: non_blank(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: non_blank(ENV_BASE_URL)
                    .map(|url| url.trim().trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
