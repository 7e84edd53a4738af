//! Container registry client.
//!
//! Unique responsibility: read usage statistics from the `DownToZero`
//! container registry.
//!
//! API endpoint used:
//! - GET <https://cr.dtz.rocks/api/2023-12-28/stats>
//! - Header: X-API-KEY: <key>

use std::{fmt, time::Duration};

use serde::Deserialize;
use tracing::debug;

use crate::dtz_config::DtzConfig;

/// Client for the container registry service.
pub struct RegistryClient {
    cfg: DtzConfig,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Create a new registry client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cfg: DtzConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(RegistryError::Http)?;

        Ok(Self { cfg, http })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &DtzConfig {
        &self.cfg
    }

    /// Fetch registry statistics for the current context.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let url = format!("{}/stats", self.cfg.registry_url.trim_end_matches('/'));

        debug!(url, "querying container registry stats");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(RegistryError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, body = %body, "registry response");

        if !status.is_success() {
            return Err(RegistryError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| RegistryError::Json { source: e, body })
    }
}

/// Registry usage statistics.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct RegistryStats {
    /// URL of the registry server for this context.
    pub serverUrl: String,
    /// Number of images stored in the registry.
    pub imageCount: i64,
}

/// Error type for registry operations.
#[derive(Debug)]
pub enum RegistryError {
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

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json { source, .. } => write!(f, "json error: {source}"),
            Self::Api { status, body } => {
                write!(f, "registry api error: status={status}, body={body}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::RegistryStats;

    #[test]
    fn stats_decode_from_wire_shape() {
        let stats: RegistryStats =
            serde_json::from_str(r#"{"serverUrl":"https://cr.dtz.rocks","imageCount":12}"#)
                .unwrap();
        assert_eq!(stats.serverUrl, "https://cr.dtz.rocks");
        assert_eq!(stats.imageCount, 12);
    }
}
