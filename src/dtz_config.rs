//! Shared platform configuration.
//!
//! Unique responsibility: hold the API key, per-service base URLs, and
//! HTTP tuning shared by every client in this crate.
//!
//! Every `DownToZero` service authenticates the same way (a static
//! `X-API-KEY` header), so one key configured here is threaded into all
//! clients. All values are loadable from environment variables.

use std::{env, fmt};

/// Configuration shared by all `DownToZero` API clients.
#[derive(Clone, Debug)]
pub struct DtzConfig {
    /// API key sent as the `X-API-KEY` header on every request.
    /// Env: `DTZ_API_KEY` (required)
    pub api_key: String,

    /// Base URL of the containers service.
    /// Env: `DTZ_CONTAINERS_URL` (default: "<https://containers.dtz.rocks/api/2021-02-21>")
    pub containers_url: String,

    /// Base URL of the container registry service.
    /// Env: `DTZ_REGISTRY_URL` (default: "<https://cr.dtz.rocks/api/2023-12-28>")
    pub registry_url: String,

    /// Base URL of the rss2email service.
    /// Env: `DTZ_RSS2EMAIL_URL` (default: "<https://rss2email.dtz.rocks/api/2021-02-01>")
    pub rss2email_url: String,

    /// Base URL of the identity service.
    /// Env: `DTZ_IDENTITY_URL` (default: "<https://identity.dtz.rocks/api/2021-02-21>")
    pub identity_url: String,

    /// Base URL of the account context service.
    /// Env: `DTZ_CONTEXT_URL` (default: "<https://dtz.rocks/api/2021-12-09>")
    pub context_url: String,

    /// HTTP request timeout in milliseconds.
    /// Env: `DTZ_HTTP_TIMEOUT_MS` (default: 15000)
    pub timeout_ms: u64,

    /// Maximum number of retry attempts for transient failures.
    /// Env: `DTZ_HTTP_RETRY_MAX` (default: 3)
    pub retry_max: u32,

    /// Backoff time between retries in milliseconds.
    /// Env: `DTZ_HTTP_RETRY_BACKOFF_MS` (default: 250)
    pub retry_backoff_ms: u64,

    /// User agent for HTTP requests.
    /// Env: `DTZ_USER_AGENT` (default: "dtz-cloud/0.1")
    pub user_agent: String,
}

const DEFAULT_CONTAINERS_URL: &str = "https://containers.dtz.rocks/api/2021-02-21";
const DEFAULT_REGISTRY_URL: &str = "https://cr.dtz.rocks/api/2023-12-28";
const DEFAULT_RSS2EMAIL_URL: &str = "https://rss2email.dtz.rocks/api/2021-02-01";
const DEFAULT_IDENTITY_URL: &str = "https://identity.dtz.rocks/api/2021-02-21";
const DEFAULT_CONTEXT_URL: &str = "https://dtz.rocks/api/2021-12-09";

impl DtzConfig {
    /// Create a configuration with the given API key and default values
    /// for everything else.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            containers_url: DEFAULT_CONTAINERS_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            rss2email_url: DEFAULT_RSS2EMAIL_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            context_url: DEFAULT_CONTEXT_URL.to_string(),
            timeout_ms: 15_000,
            retry_max: 3,
            retry_backoff_ms: 250,
            user_agent: "dtz-cloud/0.1".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// In local dev, this will also attempt to load `.env` from the
    /// current directory. If `.env` is missing, it does not fail.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// invalid.
    pub fn from_env() -> Result<Self, DtzConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_key: must_env("DTZ_API_KEY")?,
            containers_url: env_or("DTZ_CONTAINERS_URL", DEFAULT_CONTAINERS_URL),
            registry_url: env_or("DTZ_REGISTRY_URL", DEFAULT_REGISTRY_URL),
            rss2email_url: env_or("DTZ_RSS2EMAIL_URL", DEFAULT_RSS2EMAIL_URL),
            identity_url: env_or("DTZ_IDENTITY_URL", DEFAULT_IDENTITY_URL),
            context_url: env_or("DTZ_CONTEXT_URL", DEFAULT_CONTEXT_URL),
            timeout_ms: parse_u64_env("DTZ_HTTP_TIMEOUT_MS", 15_000)?,
            retry_max: parse_u32_env("DTZ_HTTP_RETRY_MAX", 3)?,
            retry_backoff_ms: parse_u64_env("DTZ_HTTP_RETRY_BACKOFF_MS", 250)?,
            user_agent: env_or("DTZ_USER_AGENT", "dtz-cloud/0.1"),
        })
    }
}

/// Error type for configuration loading.
#[derive(Debug)]
pub enum DtzConfigError {
    /// Missing required environment variable.
    MissingEnv(&'static str),
    /// Invalid environment variable value.
    InvalidEnv {
        /// The environment variable key.
        key: &'static str,
        /// The reason for invalidity.
        reason: &'static str,
    },
}

impl fmt::Display for DtzConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(k) => write!(f, "missing required env var: {k}"),
            Self::InvalidEnv { key, reason } => write!(f, "invalid env var {key}: {reason}"),
        }
    }
}

impl std::error::Error for DtzConfigError {}

#[inline]
fn must_env(key: &'static str) -> Result<String, DtzConfigError> {
    env::var(key).map_err(|_| DtzConfigError::MissingEnv(key))
}

#[inline]
fn env_or(key: &'static str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[inline]
fn parse_u64_env(key: &'static str, default: u64) -> Result<u64, DtzConfigError> {
    env::var(key).map_or_else(
        |_| Ok(default),
        |v| {
            v.parse::<u64>().map_err(|_| DtzConfigError::InvalidEnv {
                key,
                reason: "expected an unsigned integer",
            })
        },
    )
}

#[inline]
fn parse_u32_env(key: &'static str, default: u32) -> Result<u32, DtzConfigError> {
    env::var(key).map_or_else(
        |_| Ok(default),
        |v| {
            v.parse::<u32>().map_err(|_| DtzConfigError::InvalidEnv {
                key,
                reason: "expected an unsigned integer",
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::DtzConfig;

    #[test]
    fn new_applies_defaults() {
        let cfg = DtzConfig::new("test-key");
        assert_eq!(cfg.api_key, "test-key");
        assert_eq!(
            cfg.containers_url,
            "https://containers.dtz.rocks/api/2021-02-21"
        );
        assert_eq!(cfg.registry_url, "https://cr.dtz.rocks/api/2023-12-28");
        assert_eq!(
            cfg.rss2email_url,
            "https://rss2email.dtz.rocks/api/2021-02-01"
        );
        assert_eq!(cfg.timeout_ms, 15_000);
        assert_eq!(cfg.retry_max, 3);
        assert_eq!(cfg.retry_backoff_ms, 250);
    }
}
