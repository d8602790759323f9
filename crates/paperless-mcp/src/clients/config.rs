//! Paperless-ngx connection configuration.
//!
//! Holds the immutable connection settings the API client is built from.
//! Resolution from the command line and environment happens in the binary;
//! the client only ever sees a finished [`PaperlessConfig`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default Paperless-ngx REST API version sent in the `Accept` header.
pub const DEFAULT_API_VERSION: u32 = 5;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value was not supplied on the command line or in the environment.
    #[error("Missing required configuration value: {0}")]
    Missing(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Connection settings for a Paperless-ngx instance.
#[derive(Clone)]
pub struct PaperlessConfig {
    /// Root URL of the instance (e.g., "https://paperless.example.com").
    pub base_url: String,

    /// API token sent as `Authorization: Token <token>`.
    pub token: String,

    /// REST API version pinned in the `Accept` header.
    pub api_version: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl PaperlessConfig {
    /// Create a configuration with default API version and timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            api_version: DEFAULT_API_VERSION,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the pinned API version.
    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the full URL for an API path, e.g. `/documents/` becomes
    /// `{base_url}/api/documents/`.
    pub fn api_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/api/{}", base, path)
    }

    /// Value of the `Accept` header for this API version.
    pub fn accept_header(&self) -> String {
        format!("application/json; version={}", self.api_version)
    }

    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Check that the configuration can be used to build a client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("PAPERLESS_URL".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("API_KEY".to_string()));
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.api_version == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api_version".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for PaperlessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperlessConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
