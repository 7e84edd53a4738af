//! RSS-to-email service client.
//!
//! Unique responsibility: look up monitored feeds and manage the email
//! delivery profile of the current context.
//!
//! API endpoints used:
//! - GET <https://rss2email.dtz.rocks/api/2021-02-01/rss2email/feed/{id}>
//! - GET/POST <https://rss2email.dtz.rocks/api/2021-02-01/rss2email/profile>
//! - Header: X-API-KEY: <key>
//!
//! The platform exposes no delete endpoint for profiles; `set_profile`
//! is an upsert and "deleting" a profile is purely a caller-side act.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dtz_config::DtzConfig;

/// Client for the rss2email service.
pub struct Rss2emailClient {
    cfg: DtzConfig,
    http: reqwest::Client,
}

impl Rss2emailClient {
    /// Create a new rss2email client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cfg: DtzConfig) -> Result<Self, Rss2emailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(Rss2emailError::Http)?;

        Ok(Self { cfg, http })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &DtzConfig {
        &self.cfg
    }

    /// Fetch a monitored feed by id.
    ///
    /// Returns `Ok(None)` if the feed does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_feed(&self, feed_id: &str) -> Result<Option<FeedDetails>, Rss2emailError> {
        let url = format!("{}/rss2email/feed/{feed_id}", self.base_url());

        debug!(url, "querying rss2email feed");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(Rss2emailError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, body = %body, "rss2email feed response");

        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Rss2emailError::Api { status, body });
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| Rss2emailError::Json { source: e, body })
    }

    /// Fetch the email delivery profile of the current context.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_profile(&self) -> Result<ProfileDetails, Rss2emailError> {
        let url = format!("{}/rss2email/profile", self.base_url());

        debug!(url, "querying rss2email profile");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(Rss2emailError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, body = %body, "rss2email profile response");

        if !status.is_success() {
            return Err(Rss2emailError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| Rss2emailError::Json { source: e, body })
    }

    /// Create or replace the email delivery profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn set_profile(&self, spec: &ProfileSpec) -> Result<ProfileDetails, Rss2emailError> {
        let url = format!("{}/rss2email/profile", self.base_url());

        debug!(url, "submitting rss2email profile");

        let resp = self
            .http
            .post(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .json(spec)
            .send()
            .await
            .map_err(Rss2emailError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, body = %body, "rss2email profile response");

        if !status.is_success() {
            return Err(Rss2emailError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| Rss2emailError::Json { source: e, body })
    }

    fn base_url(&self) -> &str {
        self.cfg.rss2email_url.trim_end_matches('/')
    }
}

/// A monitored feed as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct FeedDetails {
    /// Feed id.
    pub id: String,
    /// Feed URL.
    pub url: String,
    /// Display name derived from the feed.
    pub name: String,
    /// Timestamp of the last poll.
    pub lastCheck: String,
    /// Timestamp of the last poll that yielded new entries.
    pub lastDataFound: String,
    /// Whether the feed is currently polled.
    pub enabled: bool,
}

/// Email delivery profile definition.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSpec {
    /// Destination email address.
    pub email: String,
    /// Subject template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Body template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// The email delivery profile as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDetails {
    /// Destination email address.
    pub email: String,
    /// Subject template.
    pub subject: Option<String>,
    /// Body template.
    pub body: Option<String>,
}

/// Error type for rss2email operations.
#[derive(Debug)]
pub enum Rss2emailError {
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

impl fmt::Display for Rss2emailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json { source, .. } => write!(f, "json error: {source}"),
            Self::Api { status, body } => {
                write!(f, "rss2email api error: status={status}, body={body}")
            }
        }
    }
}

impl std::error::Error for Rss2emailError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::{FeedDetails, ProfileSpec};

    #[test]
    fn feed_decodes_from_wire_shape() {
        let feed: FeedDetails = serde_json::from_value(json!({
            "id": "feed-1",
            "url": "https://blog.example.org/rss.xml",
            "name": "Example Blog",
            "lastCheck": "2024-03-01T06:00:00Z",
            "lastDataFound": "2024-02-28T06:00:00Z",
            "enabled": true,
        }))
        .unwrap();
        assert_eq!(feed.id, "feed-1");
        assert!(feed.enabled);
    }

    #[test]
    fn profile_spec_omits_absent_templates() {
        let spec = ProfileSpec {
            email: "ops@example.org".to_string(),
            subject: None,
            body: None,
        };
        assert_eq!(
            serde_json::to_value(spec).unwrap(),
            json!({"email": "ops@example.org"})
        );
    }
}
