//! Account context client.
//!
//! Unique responsibility: resolve the context (tenant) the configured
//! API key belongs to.
//!
//! API endpoint used:
//! - GET <https://dtz.rocks/api/2021-12-09/context>
//! - Header: X-API-KEY: <key>

use std::{fmt, time::Duration};

use serde::Deserialize;
use tracing::debug;

use crate::dtz_config::DtzConfig;

/// Client for the account context service.
pub struct ContextClient {
    cfg: DtzConfig,
    http: reqwest::Client,
}

impl ContextClient {
    /// Create a new context client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cfg: DtzConfig) -> Result<Self, ContextError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(ContextError::Http)?;

        Ok(Self { cfg, http })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &DtzConfig {
        &self.cfg
    }

    /// Fetch the context bound to the configured API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_context(&self) -> Result<ContextDetails, ContextError> {
        let url = format!("{}/context", self.cfg.context_url.trim_end_matches('/'));

        debug!(url, "querying account context");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(ContextError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, body = %body, "context response");

        if !status.is_success() {
            return Err(ContextError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| ContextError::Json { source: e, body })
    }
}

/// The account context as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct ContextDetails {
    /// Context id.
    pub contextId: String,
    /// Human-readable alias.
    pub alias: String,
    /// Creation timestamp.
    pub created: Option<String>,
}

/// Error type for context operations.
#[derive(Debug)]
pub enum ContextError {
    /// HTTP client error.
    Http(reqwest::Error),
    /// JSON decode error.
    Json {
        /// The JSON parsing error.
        source: serde_json::Error,
        /// The response body.
        body: String,
    },
    /// API error response.
    Api {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body.
        body: String,
    },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json { source, .. } => write!(f, "json error: {source}"),
            Self::Api { status, body } => {
                write!(f, "context api error: status={status}, body={body}")
            }
        }
    }
}

impl std::error::Error for ContextError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ContextDetails;

    #[test]
    fn context_decodes_with_and_without_created() {
        let full: ContextDetails = serde_json::from_str(
            r#"{"contextId":"ctx-1","alias":"prod","created":"2023-05-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(full.contextId, "ctx-1");
        assert_eq!(full.alias, "prod");
        assert!(full.created.is_some());

        let bare: ContextDetails =
            serde_json::from_str(r#"{"contextId":"ctx-2","alias":"dev"}"#).unwrap();
        assert!(bare.created.is_none());
    }
}
