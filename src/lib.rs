//! `DownToZero` cloud platform client library.
//!
//! Typed async clients for the platform's REST APIs:
//! - **Containers**: scheduled jobs, HTTP services, and custom domains
//! - **Registry**: container registry statistics
//! - **rss2email**: monitored feeds and the email delivery profile
//! - **Identity**: API key management and authentication inventory
//! - **Context**: account/tenant resolution
//!
//! Every service authenticates with the same static API key, sent as an
//! `X-API-KEY` header. Configuration is loaded from environment variables.
//! Create a `.env` file:
//!
//! ```text
//! DTZ_API_KEY=your_api_key_here
//! ```
//!
//! Then build clients from the shared configuration:
//!
//! ```ignore
//! use dtz_cloud::{ContainersClient, DtzConfig, JobSpec, ScheduleType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = DtzConfig::from_env()?;
//!     let containers = ContainersClient::new(cfg)?;
//!
//!     let job = containers
//!         .create_job(&JobSpec {
//!             name: "nightly-report".into(),
//!             containerImage: "cr.dtz.rocks:3214/report".into(),
//!             containerPullUser: None,
//!             containerPullPwd: None,
//!             scheduleType: ScheduleType::Relaxed,
//!             scheduleCron: Some("0 3 * * *".into()),
//!             scheduleRepeat: None,
//!             envVariables: None,
//!         })
//!         .await?;
//!     println!("created job {} running {}", job.id, job.containerImage);
//!
//!     Ok(())
//! }
//! ```
//!
//! Unversioned image references are pinned to `:latest` before
//! submission; see [`container_image`].

// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy for strict discipline
#![deny(clippy::all)]                 // All standard Clippy lints
#![deny(clippy::pedantic)]            // Very strict Clippy lints
#![deny(clippy::nursery)]             // Experimental lints
#![deny(clippy::unwrap_used)]         // unwrap() is forbidden
#![deny(clippy::expect_used)]         // expect() is forbidden
#![deny(clippy::panic)]               // panic!() is forbidden
#![deny(clippy::print_stdout)]        // println!() is forbidden in production
#![deny(clippy::todo)]                // TODO is forbidden
#![deny(clippy::unimplemented)]       // unimplemented!() is forbidden
#![deny(clippy::missing_const_for_fn)] // Force const when possible
#![deny(clippy::unwrap_in_result)]    // unwrap() in Result is forbidden
#![deny(clippy::module_inception)]    // Module with same name as crate is forbidden
#![deny(clippy::redundant_clone)]     // Useless clones are forbidden
#![deny(clippy::shadow_unrelated)]    // Shadowing unrelated variables is forbidden
#![deny(clippy::too_many_arguments)]  // Limit function arguments
#![deny(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Modules
// ============================================================================

/// Container image reference classification and normalization.
///
/// Use this module to pin unversioned image references to `:latest`.
pub mod container_image;

/// Environment variable value model for jobs and services.
///
/// Use this module for the string/encrypted/plain value union carried in
/// `envVariables` maps.
pub mod env_value;

/// Shared platform configuration (API key, base URLs, HTTP tuning).
pub mod dtz_config;

/// Containers service client: jobs, services, and domains.
pub mod dtz_containers;

/// Container registry statistics client.
pub mod dtz_registry;

/// rss2email client: monitored feeds and the delivery profile.
pub mod dtz_rss2email;

/// Identity client: API keys and the authentication inventory.
pub mod dtz_identity;

/// Account context client.
pub mod dtz_context;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use container_image::{has_explicit_version, normalize_image};
pub use dtz_config::{DtzConfig, DtzConfigError};
pub use dtz_containers::{
    ContainersClient, ContainersError, DomainDetails, JobDetails, JobSpec, ScheduleType,
    ServiceDetails, ServiceLogin, ServiceSpec,
};
pub use dtz_context::{ContextClient, ContextDetails, ContextError};
pub use dtz_identity::{
    ApikeyAuth, AuthenticationDetails, CreatedApikey, IdentityClient, IdentityError,
};
pub use dtz_registry::{RegistryClient, RegistryError, RegistryStats};
pub use dtz_rss2email::{
    FeedDetails, ProfileDetails, ProfileSpec, Rss2emailClient, Rss2emailError,
};
pub use env_value::{EnvValueDecodeError, EnvVariableValue};
