//! Identity service client.
//!
//! Unique responsibility: manage API keys and read the authentication
//! inventory of the calling identity.
//!
//! API endpoints used:
//! - POST <https://identity.dtz.rocks/api/2021-02-21/me/identity/apikey>
//! - GET <https://identity.dtz.rocks/api/2021-02-21/authentication>
//! - DELETE <https://identity.dtz.rocks/api/2021-02-21/apikey/{key}>
//! - Header: X-API-KEY: <key>
//!
//! Key creation answers with the raw key material as the response body,
//! not a JSON document.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dtz_config::DtzConfig;

/// Client for the identity service.
pub struct IdentityClient {
    cfg: DtzConfig,
    http: reqwest::Client,
}

impl IdentityClient {
    /// Create a new identity client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cfg: DtzConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(IdentityError::Http)?;

        Ok(Self { cfg, http })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &DtzConfig {
        &self.cfg
    }

    /// Create a new API key for the given context.
    ///
    /// The platform returns the key material as the raw response body; it
    /// is trimmed of surrounding whitespace and quotes and otherwise
    /// treated as opaque.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn create_apikey(
        &self,
        alias: &str,
        context_id: &str,
    ) -> Result<CreatedApikey, IdentityError> {
        let url = format!("{}/me/identity/apikey", self.base_url());
        let request = CreateApikeyRequest {
            alias: alias.to_string(),
            contextId: context_id.to_string(),
        };

        debug!(url, alias, context_id, "creating apikey");

        let resp = self
            .http
            .post(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .json(&request)
            .send()
            .await
            .map_err(IdentityError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, "apikey creation response");

        if !status.is_success() {
            return Err(IdentityError::Api { status, body });
        }

        let apikey = extract_key_material(&body);
        if apikey.is_empty() {
            return Err(IdentityError::EmptyKeyMaterial);
        }

        Ok(CreatedApikey {
            apikey,
            alias: alias.to_string(),
            context_id: context_id.to_string(),
        })
    }

    /// Fetch the authentication inventory of the calling identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_authentication(&self) -> Result<AuthenticationDetails, IdentityError> {
        let url = format!("{}/authentication", self.base_url());

        debug!(url, "querying authentication inventory");

        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(IdentityError::Http)?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        debug!(%status, "authentication response");

        if !status.is_success() {
            return Err(IdentityError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| IdentityError::Json { source: e, body })
    }

    /// Look up one API key in the authentication inventory.
    ///
    /// Returns `Ok(None)` if the key is not registered for this identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn find_apikey(&self, apikey: &str) -> Result<Option<ApikeyAuth>, IdentityError> {
        let auth = self.get_authentication().await?;
        Ok(auth.apiKeyAuth.into_iter().find(|a| a.apiKey == apikey))
    }

    /// Delete an API key. A key that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// other than 404.
    pub async fn delete_apikey(&self, apikey: &str) -> Result<(), IdentityError> {
        let url = format!("{}/apikey/{apikey}", self.base_url());

        debug!(url, "deleting apikey");

        let resp = self
            .http
            .delete(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(IdentityError::Http)?;

        let status = resp.status();

        if status.as_u16() == 404 || status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(IdentityError::Api { status, body })
    }

    fn base_url(&self) -> &str {
        self.cfg.identity_url.trim_end_matches('/')
    }
}

/// Strip whitespace and one layer of JSON-style quoting from raw key
/// material.
fn extract_key_material(body: &str) -> String {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct CreateApikeyRequest {
    alias: String,
    contextId: String,
}

/// A freshly created API key.
#[derive(Debug, Clone)]
pub struct CreatedApikey {
    /// Raw key material. Treat as a secret.
    pub apikey: String,
    /// Alias the key was created under.
    pub alias: String,
    /// Context the key is bound to.
    pub context_id: String,
}

/// One API-key credential in the authentication inventory.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct ApikeyAuth {
    /// Raw key material.
    pub apiKey: String,
    /// Context the key defaults to.
    pub defaultContextId: String,
    /// Alias the key was created under.
    pub alias: Option<String>,
}

/// The authentication inventory of an identity.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct AuthenticationDetails {
    /// Identity id.
    pub identityId: String,
    /// API-key credentials.
    #[serde(default)]
    pub apiKeyAuth: Vec<ApikeyAuth>,
    /// User/password credentials (opaque here).
    #[serde(default)]
    pub userAuth: Vec<serde_json::Value>,
    /// OAuth credentials (opaque here).
    #[serde(default)]
    pub oauthAuth: Vec<serde_json::Value>,
}

/// Error type for identity operations.
#[derive(Debug)]
pub enum IdentityError {
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
    /// Key creation succeeded but returned no key material.
    EmptyKeyMaterial,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json { source, .. } => write!(f, "json error: {source}"),
            Self::Api { status, body } => {
                write!(f, "identity api error: status={status}, body={body}")
            }
            Self::EmptyKeyMaterial => write!(f, "apikey creation returned no key material"),
        }
    }
}

impl std::error::Error for IdentityError {}
