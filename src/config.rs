//! Session configuration.
//!
//! Built with `with_*` methods or read from `SESSION_LINK_*` environment
//! variables.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::session::coordinator::DEFAULT_RENEWAL_TIMEOUT;

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

/// Default timeout for one pipeline request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_ENDPOINT: &str = "SESSION_LINK_ENDPOINT";
pub const ENV_RENEWAL_ENDPOINT: &str = "SESSION_LINK_RENEWAL_ENDPOINT";
pub const ENV_SIGN_IN_URL: &str = "SESSION_LINK_SIGN_IN_URL";
pub const ENV_CREDENTIALS: &str = "SESSION_LINK_CREDENTIALS";
pub const ENV_RENEWAL_TIMEOUT: &str = "SESSION_LINK_RENEWAL_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT: &str = "SESSION_LINK_REQUEST_TIMEOUT_SECS";
pub const ENV_CLEAR_ON_TRANSIENT: &str = "SESSION_LINK_CLEAR_ON_TRANSIENT";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("{name} must not be empty")]
    Empty { name: &'static str },
}

/// Configuration for a [`Session`](crate::session::Session).
///
/// # Example
///
/// ```ignore
/// use session_link::config::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_endpoint("https://api.example.com/graphql")
///     .with_renewal_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// GraphQL endpoint for queries, mutations and subscriptions
    pub endpoint: String,
    /// Endpoint for the `refreshToken` mutation (defaults to `endpoint`)
    pub renewal_endpoint: Option<String>,
    /// Page opened when the session cannot be renewed
    pub sign_in_url: Option<String>,
    /// Credentials file (defaults to `~/.session-link/credentials.json`)
    pub credentials_path: Option<PathBuf>,
    /// Bound on one renewal call
    pub renewal_timeout: Duration,
    /// Bound on one HTTP request
    pub request_timeout: Duration,
    /// Sign out on transient renewal failures too
    pub clear_on_transient_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            renewal_endpoint: None,
            sign_in_url: None,
            credentials_path: None,
            renewal_timeout: DEFAULT_RENEWAL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            clear_on_transient_failure: true,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_renewal_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.renewal_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_sign_in_url(mut self, url: impl Into<String>) -> Self {
        self.sign_in_url = Some(url.into());
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn with_renewal_timeout(mut self, timeout: Duration) -> Self {
        self.renewal_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_clear_on_transient_failure(mut self, clear: bool) -> Self {
        self.clear_on_transient_failure = clear;
        self
    }

    /// Endpoint used for renewal.
    pub fn renewal_endpoint(&self) -> &str {
        self.renewal_endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    /// Read `SESSION_LINK_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`SessionConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = non_empty(ENV_ENDPOINT, endpoint)?;
        }
        if let Some(endpoint) = lookup(ENV_RENEWAL_ENDPOINT) {
            config.renewal_endpoint = Some(non_empty(ENV_RENEWAL_ENDPOINT, endpoint)?);
        }
        if let Some(url) = lookup(ENV_SIGN_IN_URL).filter(|v| !v.trim().is_empty()) {
            config.sign_in_url = Some(url);
        }
        if let Some(path) = lookup(ENV_CREDENTIALS) {
            config.credentials_path = Some(PathBuf::from(non_empty(ENV_CREDENTIALS, path)?));
        }
        if let Some(value) = lookup(ENV_RENEWAL_TIMEOUT) {
            config.renewal_timeout = parse_seconds(ENV_RENEWAL_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_seconds(ENV_REQUEST_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_CLEAR_ON_TRANSIENT) {
            config.clear_on_transient_failure = parse_bool(ENV_CLEAR_ON_TRANSIENT, &value)?;
        }

        Ok(config)
    }
}

fn non_empty(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    Ok(trimmed.to_string())
}

fn parse_seconds(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
