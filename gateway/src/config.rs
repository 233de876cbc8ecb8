use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("public_domain cannot be empty")]
    EmptyPublicDomain,

    #[error("signing secret cannot be empty")]
    EmptySigningSecret,

    #[error("signed URL TTL cannot be 0")]
    InvalidTtl,

    #[error("internal location must start and end with '/': {0}")]
    BadInternalLocation(String),
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming doc requests
    pub listener: Listener,
    /// Admin listener for health/readiness endpoints
    pub admin_listener: Listener,
    /// Domain under which project subdomains are served
    /// (e.g. "docs.example.com" serves project `acme` at
    /// "acme.docs.example.com").
    pub public_domain: String,
    pub auth: AuthConfig,
    pub registry: RegistryConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.public_domain.is_empty() {
            return Err(ValidationError::EmptyPublicDomain);
        }

        if let StorageConfig::InternalRedirect {
            secret,
            ttl_secs,
            location,
            ..
        } = &self.storage
        {
            if secret.is_empty() {
                return Err(ValidationError::EmptySigningSecret);
            }
            if *ttl_secs == 0 {
                return Err(ValidationError::InvalidTtl);
            }
            if !location.starts_with('/') || !location.ends_with('/') {
                return Err(ValidationError::BadInternalLocation(location.clone()));
            }
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g. "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_identity_header() -> String {
    "x-authenticated-user".to_string()
}

/// Authentication endpoints and identity plumbing.
///
/// The gateway never runs login flows itself; it only redirects to a login
/// endpoint and trusts the identity header set by the auth layer in front
/// of it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Login endpoint reachable from the user's browser.
    pub external_endpoint: Url,
    /// Login endpoint reachable from inside the deployment. Used while a
    /// login callback ticket is in flight, when the externally visible
    /// hostname cannot be resolved from this service.
    pub internal_endpoint: Url,
    /// Trusted header carrying the authenticated identity; absent on a
    /// request means anonymous.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Remote authorization service deciding `can_view`. When unset, the
    /// catalog-backed static policy is used instead.
    #[serde(default)]
    pub policy_endpoint: Option<Url>,
}

/// Where project/version lookups come from
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryConfig {
    /// In-process catalog loaded once from a YAML projects file
    Projects { path: PathBuf },
    /// Remote registry service
    Url { url: Url },
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_internal_location() -> String {
    "/proxito/".to_string()
}

/// Serving mode, selected by static configuration (never per request)
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Stream file bytes from a local directory. The development path.
    Direct { root: PathBuf },
    /// Instruct the edge proxy to fetch the object itself from backend
    /// storage using a time-limited signed URL. The production path.
    InternalRedirect {
        /// Backend storage base URL; only its path and query ever reach
        /// the edge proxy.
        base_url: Url,
        /// HMAC key for signing storage URLs.
        secret: String,
        #[serde(default = "default_ttl_secs")]
        ttl_secs: u64,
        /// Internal location prefix the edge proxy maps to the backend.
        #[serde(default = "default_internal_location")]
        location: String,
    },
}
