//! Containers service client (jobs, services, domains).
//!
//! Unique responsibility: CRUD operations against the `DownToZero`
//! containers API.
//!
//! API endpoints used:
//! - POST <https://containers.dtz.rocks/api/2021-02-21/job>
//! - GET/POST/DELETE <https://containers.dtz.rocks/api/2021-02-21/job/{id}>
//! - POST <https://containers.dtz.rocks/api/2021-02-21/service>
//! - GET/POST/DELETE <https://containers.dtz.rocks/api/2021-02-21/service/{id}>
//! - GET/POST <https://containers.dtz.rocks/api/2021-02-21/domain>
//! - GET/DELETE <https://containers.dtz.rocks/api/2021-02-21/domain/{name}>
//! - Header: X-API-KEY: <key>
//!
//! Image references in job and service specs are pinned to `:latest`
//! via [`normalize_image`] before submission, so the platform never sees
//! an unversioned image.

use std::{collections::HashMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::container_image::normalize_image;
use crate::dtz_config::DtzConfig;
use crate::env_value::EnvVariableValue;

/// Domain name suffix of platform-generated ingress domains.
const GENERATED_DOMAIN_SUFFIX: &str = ".containers.dtz.dev";

/// Client for the containers service.
pub struct ContainersClient {
    cfg: DtzConfig,
    http: reqwest::Client,
}

impl ContainersClient {
    /// Create a new containers client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(cfg: DtzConfig) -> Result<Self, ContainersError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(ContainersError::Http)?;

        Ok(Self { cfg, http })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &DtzConfig {
        &self.cfg
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    /// Create a scheduled container job.
    ///
    /// The spec's image reference is normalized before submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is invalid, the request fails, or the
    /// API returns an error.
    pub async fn create_job(&self, spec: &JobSpec) -> Result<JobDetails, ContainersError> {
        let url = format!("{}/job", self.base_url());
        self.submit_job(&url, spec).await
    }

    /// Fetch a job by id.
    ///
    /// Returns `Ok(None)` if the job does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobDetails>, ContainersError> {
        let url = format!("{}/job/{job_id}", self.base_url());
        let (status, body) = self.send(reqwest::Method::GET, &url, None).await?;

        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }

        parse_json(body).map(Some)
    }

    /// Replace a job's definition.
    ///
    /// The spec's image reference is normalized before submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is invalid, the request fails, or the
    /// API returns an error.
    pub async fn update_job(
        &self,
        job_id: &str,
        spec: &JobSpec,
    ) -> Result<JobDetails, ContainersError> {
        let url = format!("{}/job/{job_id}", self.base_url());
        self.submit_job(&url, spec).await
    }

    /// Delete a job. A job that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// other than 404.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), ContainersError> {
        let url = format!("{}/job/{job_id}", self.base_url());
        self.delete(&url).await
    }

    async fn submit_job(&self, url: &str, spec: &JobSpec) -> Result<JobDetails, ContainersError> {
        let mut spec = spec.clone();
        spec.containerImage = normalize_image(&spec.containerImage);

        let payload = serde_json::to_value(&spec)
            .map_err(|e| ContainersError::Json { source: e, body: String::new() })?;
        let (status, body) = self.send(reqwest::Method::POST, url, Some(&payload)).await?;

        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }
        parse_json(body)
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Create an HTTP service backed by a container image.
    ///
    /// The spec's image reference is normalized before submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is invalid, the request fails, or the
    /// API returns an error.
    pub async fn create_service(
        &self,
        spec: &ServiceSpec,
    ) -> Result<ServiceDetails, ContainersError> {
        let url = format!("{}/service", self.base_url());
        self.submit_service(&url, spec).await
    }

    /// Fetch a service by id.
    ///
    /// Returns `Ok(None)` if the service does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_service(
        &self,
        service_id: &str,
    ) -> Result<Option<ServiceDetails>, ContainersError> {
        let url = format!("{}/service/{service_id}", self.base_url());
        let (status, body) = self.send(reqwest::Method::GET, &url, None).await?;

        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }

        parse_json(body).map(Some)
    }

    /// Replace a service's definition.
    ///
    /// The spec's image reference is normalized before submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec is invalid, the request fails, or the
    /// API returns an error.
    pub async fn update_service(
        &self,
        service_id: &str,
        spec: &ServiceSpec,
    ) -> Result<ServiceDetails, ContainersError> {
        let url = format!("{}/service/{service_id}", self.base_url());
        self.submit_service(&url, spec).await
    }

    /// Delete a service. A service that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// other than 404.
    pub async fn delete_service(&self, service_id: &str) -> Result<(), ContainersError> {
        let url = format!("{}/service/{service_id}", self.base_url());
        self.delete(&url).await
    }

    async fn submit_service(
        &self,
        url: &str,
        spec: &ServiceSpec,
    ) -> Result<ServiceDetails, ContainersError> {
        validate_service_spec(spec)?;

        let mut spec = spec.clone();
        spec.containerImage = normalize_image(&spec.containerImage);

        let payload = serde_json::to_value(&spec)
            .map_err(|e| ContainersError::Json { source: e, body: String::new() })?;
        let (status, body) = self.send(reqwest::Method::POST, url, Some(&payload)).await?;

        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }
        parse_json(body)
    }

    // ------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------

    /// Register a custom domain in the current context.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn create_domain(&self, name: &str) -> Result<DomainDetails, ContainersError> {
        let url = format!("{}/domain", self.base_url());
        let payload = serde_json::json!({ "name": name });
        let (status, body) = self.send(reqwest::Method::POST, &url, Some(&payload)).await?;

        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }
        parse_json(body)
    }

    /// Fetch a domain by name.
    ///
    /// Returns `Ok(None)` if the domain does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn get_domain(&self, name: &str) -> Result<Option<DomainDetails>, ContainersError> {
        let url = format!("{}/domain/{name}", self.base_url());
        let (status, body) = self.send(reqwest::Method::GET, &url, None).await?;

        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }

        parse_json(body).map(Some)
    }

    /// List all domains in the current context.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn list_domains(&self) -> Result<Vec<DomainDetails>, ContainersError> {
        let url = format!("{}/domain", self.base_url());
        let (status, body) = self.send(reqwest::Method::GET, &url, None).await?;

        if !status.is_success() {
            return Err(ContainersError::Api { status, body });
        }
        parse_json(body)
    }

    /// Find the context's default ingress domain.
    ///
    /// Prefers the platform-generated `.containers.dtz.dev` domain,
    /// falling back to the first listed domain. Returns `Ok(None)` when
    /// the context has no domains at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    pub async fn find_default_domain(&self) -> Result<Option<DomainDetails>, ContainersError> {
        let domains = self.list_domains().await?;
        Ok(pick_default_domain(domains))
    }

    /// Delete a domain. A domain that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// other than 404.
    pub async fn delete_domain(&self, name: &str) -> Result<(), ContainersError> {
        let url = format!("{}/domain/{name}", self.base_url());
        self.delete(&url).await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    fn base_url(&self) -> &str {
        self.cfg.containers_url.trim_end_matches('/')
    }

    async fn delete(&self, url: &str) -> Result<(), ContainersError> {
        let (status, body) = self.send(reqwest::Method::DELETE, url, None).await?;

        if status.as_u16() == 404 || status.is_success() {
            return Ok(());
        }
        Err(ContainersError::Api { status, body })
    }

    /// Send a request, retrying transient failures with exponential
    /// backoff. Returns the final status and body for the caller to
    /// interpret (404 handling differs per operation).
    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(reqwest::StatusCode, String), ContainersError> {
        let mut attempt: u32 = 0;
        let mut backoff = Duration::from_millis(self.cfg.retry_backoff_ms);

        loop {
            attempt = attempt.saturating_add(1);

            debug!(%method, url, attempt, "sending containers request");

            let mut request = self
                .http
                .request(method.clone(), url)
                .header("X-API-KEY", &self.cfg.api_key);
            if let Some(json) = body {
                request = request.json(json);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();

                    if !status.is_success()
                        && attempt <= self.cfg.retry_max
                        && is_retryable_status(status)
                    {
                        warn!(%status, url, attempt, "transient api failure, retrying");
                        tokio::time::sleep(backoff).await;
                        backoff = next_backoff(backoff);
                        continue;
                    }

                    debug!(%status, body = %text, "containers response");
                    return Ok((status, text));
                }
                Err(e) => {
                    if attempt <= self.cfg.retry_max && is_retryable_reqwest(&e) {
                        warn!(error = %e, url, attempt, "transient http failure, retrying");
                        tokio::time::sleep(backoff).await;
                        backoff = next_backoff(backoff);
                        continue;
                    }

                    return Err(ContainersError::Http(e));
                }
            }
        }
    }
}

/// Pick the preferred domain from a context's domain list.
fn pick_default_domain(domains: Vec<DomainDetails>) -> Option<DomainDetails> {
    let index = domains
        .iter()
        .position(|d| d.name.ends_with(GENERATED_DOMAIN_SUFFIX))
        .unwrap_or(0);

    domains.into_iter().nth(index)
}

fn validate_service_spec(spec: &ServiceSpec) -> Result<(), ContainersError> {
    if let Some(login) = &spec.login {
        if login.providerName.is_empty() {
            return Err(ContainersError::InvalidSpec(
                "login provider name must not be empty",
            ));
        }
        if login.providerName != "dtz" {
            return Err(ContainersError::InvalidSpec(
                "only the 'dtz' login provider is supported",
            ));
        }
    }
    Ok(())
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: String) -> Result<T, ContainersError> {
    serde_json::from_str(&body).map_err(|e| ContainersError::Json { source: e, body })
}

// ============================================================================
// Input/Output types
// ============================================================================

/// How a job is scheduled by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// Run roughly at the requested cadence, batched with other work.
    Relaxed,
    /// Run exactly on the cron schedule.
    Precise,
    /// No automatic schedule; triggered externally.
    None,
}

/// Definition of a scheduled container job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct JobSpec {
    /// Job name.
    pub name: String,
    /// Container image reference; pinned to `:latest` when unversioned.
    pub containerImage: String,
    /// Registry pull user for private images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerPullUser: Option<String>,
    /// Registry pull password for private images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerPullPwd: Option<String>,
    /// Schedule type.
    pub scheduleType: ScheduleType,
    /// Cron expression, for cron-driven schedules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduleCron: Option<String>,
    /// Repeat interval, for interval-driven schedules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduleRepeat: Option<String>,
    /// Environment variables by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envVariables: Option<HashMap<String, EnvVariableValue>>,
}

/// A job as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct JobDetails {
    /// Job id.
    pub id: String,
    /// Job name.
    pub name: String,
    /// Container image reference.
    pub containerImage: String,
    /// Registry pull user.
    pub containerPullUser: Option<String>,
    /// Registry pull password.
    pub containerPullPwd: Option<String>,
    /// Schedule type.
    pub scheduleType: ScheduleType,
    /// Repeat interval.
    pub scheduleRepeat: Option<String>,
    /// Cron expression.
    pub scheduleCron: Option<String>,
    /// Environment variables by name.
    #[serde(default)]
    pub envVariables: Option<HashMap<String, EnvVariableValue>>,
}

/// Login block for services that sit behind platform authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct ServiceLogin {
    /// Login provider name. Only "dtz" is currently supported.
    pub providerName: String,
}

/// Definition of an HTTP service backed by a container image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct ServiceSpec {
    /// Path prefix the service is mounted under.
    pub prefix: String,
    /// Container image reference; pinned to `:latest` when unversioned.
    pub containerImage: String,
    /// Deprecated: include the tag or digest in `containerImage` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerImageVersion: Option<String>,
    /// Registry pull user for private images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerPullUser: Option<String>,
    /// Registry pull password for private images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerPullPwd: Option<String>,
    /// Environment variables by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envVariables: Option<HashMap<String, EnvVariableValue>>,
    /// Optional login requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<ServiceLogin>,
}

/// A service as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct ServiceDetails {
    /// Owning context id.
    pub contextId: String,
    /// Service id.
    pub serviceId: String,
    /// Creation timestamp.
    pub created: String,
    /// Path prefix the service is mounted under.
    pub prefix: String,
    /// Container image reference.
    pub containerImage: String,
    /// Deprecated image version field, echoed back when set.
    pub containerImageVersion: Option<String>,
    /// Registry pull user.
    pub containerPullUser: Option<String>,
    /// Registry pull password.
    pub containerPullPwd: Option<String>,
    /// Environment variables by name.
    #[serde(default)]
    pub envVariables: Option<HashMap<String, EnvVariableValue>>,
    /// Login requirement, when configured.
    pub login: Option<ServiceLogin>,
}

/// A domain registration as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct DomainDetails {
    /// Owning context id.
    pub contextId: String,
    /// Domain name.
    pub name: String,
    /// Whether DNS ownership has been verified.
    pub verified: bool,
    /// Creation timestamp.
    pub created: String,
}

// ============================================================================
// Error type
// ============================================================================

/// Error type for containers operations.
#[derive(Debug)]
pub enum ContainersError {
    /// HTTP client error.
    Http(reqwest::Error),
    /// JSON encode/decode error.
    Json {
        /// The JSON error.
        source: serde_json::Error,
        /// The offending body, when decoding a response.
        body: String,
    },
    /// API error response.
    Api {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body.
        body: String,
    },
    /// The spec is rejected before submission.
    InvalidSpec(&'static str),
}

impl fmt::Display for ContainersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json { source, .. } => write!(f, "json error: {source}"),
            Self::Api { status, body } => {
                write!(f, "containers api error: status={status}, body={body}")
            }
            Self::InvalidSpec(reason) => write!(f, "invalid spec: {reason}"),
        }
    }
}

impl std::error::Error for ContainersError {}

// ============================================================================
// Helper functions
// ============================================================================

#[inline]
const fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    matches!(
        status.as_u16(),
        408 | 409 | 425 | 429 | 500 | 502 | 503 | 504
    )
}

#[inline]
fn is_retryable_reqwest(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

#[inline]
fn next_backoff(current: Duration) -> Duration {
    // Exponential backoff capped at 5 seconds.
    let next = current.saturating_mul(2);
    next.min(Duration::from_secs(5))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::{
        ContainersError, DomainDetails, JobSpec, ScheduleType, ServiceLogin, ServiceSpec,
        pick_default_domain, validate_service_spec,
    };
    use crate::env_value::EnvVariableValue;

    fn minimal_job_spec() -> JobSpec {
        JobSpec {
            name: "nightly-report".to_string(),
            containerImage: "nginx:alpine".to_string(),
            containerPullUser: None,
            containerPullPwd: None,
            scheduleType: ScheduleType::Relaxed,
            scheduleCron: Some("0 0 * * *".to_string()),
            scheduleRepeat: None,
            envVariables: None,
        }
    }

    fn domain(name: &str) -> DomainDetails {
        DomainDetails {
            contextId: "ctx-1".to_string(),
            name: name.to_string(),
            verified: true,
            created: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn job_spec_serializes_without_absent_fields() {
        let value = serde_json::to_value(minimal_job_spec()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "nightly-report",
                "containerImage": "nginx:alpine",
                "scheduleType": "relaxed",
                "scheduleCron": "0 0 * * *",
            })
        );
    }

    #[test]
    fn job_spec_env_variables_use_wire_shapes() {
        let mut env = HashMap::new();
        env.insert("PORT".to_string(), EnvVariableValue::string("8080"));
        env.insert(
            "DB_PASSWORD".to_string(),
            EnvVariableValue::encrypted("key-1", "ciphertext"),
        );

        let mut spec = minimal_job_spec();
        spec.envVariables = Some(env);

        let value = serde_json::to_value(spec).unwrap();
        assert_eq!(value["envVariables"]["PORT"], json!("8080"));
        assert_eq!(
            value["envVariables"]["DB_PASSWORD"],
            json!({"encryptionKey": "key-1", "encryptedValue": "ciphertext"})
        );
    }

    #[test]
    fn schedule_type_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_value(ScheduleType::Relaxed).unwrap(),
            json!("relaxed")
        );
        assert_eq!(
            serde_json::to_value(ScheduleType::Precise).unwrap(),
            json!("precise")
        );
        assert_eq!(
            serde_json::to_value(ScheduleType::None).unwrap(),
            json!("none")
        );
        assert_eq!(
            serde_json::from_value::<ScheduleType>(json!("precise")).unwrap(),
            ScheduleType::Precise
        );
    }

    #[test]
    fn service_spec_rejects_unknown_login_provider() {
        let spec = ServiceSpec {
            prefix: "/app".to_string(),
            containerImage: "nginx".to_string(),
            containerImageVersion: None,
            containerPullUser: None,
            containerPullPwd: None,
            envVariables: None,
            login: Some(ServiceLogin {
                providerName: "github".to_string(),
            }),
        };
        assert!(matches!(
            validate_service_spec(&spec),
            Err(ContainersError::InvalidSpec(_))
        ));

        let spec = ServiceSpec {
            login: Some(ServiceLogin {
                providerName: "dtz".to_string(),
            }),
            ..spec
        };
        assert!(validate_service_spec(&spec).is_ok());
    }

    #[test]
    fn default_domain_prefers_generated_name() {
        let picked = pick_default_domain(vec![
            domain("example.org"),
            domain("ctx-1.containers.dtz.dev"),
            domain("example.net"),
        ])
        .unwrap();
        assert_eq!(picked.name, "ctx-1.containers.dtz.dev");
    }

    #[test]
    fn default_domain_falls_back_to_first() {
        let picked = pick_default_domain(vec![domain("example.org"), domain("example.net")]);
        assert_eq!(picked.unwrap().name, "example.org");

        assert!(pick_default_domain(Vec::new()).is_none());
    }
}
