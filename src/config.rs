//! Configuration file parser for ~/.config/rapydo/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde but logged as warnings, since they are
//! usually typos. `RAPYDO_SERVER_URL` and `RAPYDO_AUTH_TOKEN` override the file.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::api::ApiConfig;

pub const SERVER_URL_ENV: &str = "RAPYDO_SERVER_URL";
pub const AUTH_TOKEN_ENV: &str = "RAPYDO_AUTH_TOKEN";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Application configuration.
///
/// Every field has a default, so any subset of keys can be specified.
/// `Debug` masks `auth_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the blog API.
    pub server_url: String,

    /// Bearer token for mutating calls. Without it, only reads work.
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Page size of the search listing.
    pub posts_per_page: usize,

    /// Page size of the browse-by-category listing.
    pub category_posts_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            posts_per_page: 8,
            category_posts_per_page: 9,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("posts_per_page", &self.posts_per_page)
            .field("category_posts_per_page", &self.category_posts_per_page)
            .finish()
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "server_url",
        "auth_token",
        "request_timeout_secs",
        "posts_per_page",
        "category_posts_per_page",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing, empty or whitespace-only file → `Ok(Config::default())`
    /// - Larger than 1 MiB → `Err(ConfigError::TooLarge)`
    /// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), server_url = %config.server_url, "Loaded configuration");
        Ok(config)
    }

    /// Applies `RAPYDO_SERVER_URL` / `RAPYDO_AUTH_TOKEN` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(SERVER_URL_ENV) {
            tracing::debug!(server_url = %url, "Server URL overridden by environment");
            self.server_url = url;
        }
        if let Some(token) = non_empty(AUTH_TOKEN_ENV) {
            tracing::debug!("Auth token provided by environment");
            self.auth_token = Some(token);
        }
        self
    }

    /// Connection settings for [`crate::api::ApiClient`].
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.server_url.clone(),
            auth_token: self.auth_token.clone().map(Into::into),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
