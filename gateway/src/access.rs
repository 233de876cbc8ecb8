//! Access gate: decides ALLOW / CHALLENGE / DENY for an identity and a
//! located version.
//!
//! The authorization rules themselves live behind the [`ViewPolicy`] seam;
//! this module only implements the branching around the predicate's result.
//! Authorization is version-scoped, so the gate runs exactly once per
//! request, after the version is known and before any storage access.

use crate::config::AuthConfig;
use crate::policy::PolicyError;
use async_trait::async_trait;
use hyper::HeaderMap;
use registry::Version;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(String),
}

impl Identity {
    /// Reads the identity from the trusted header the auth layer sets.
    /// Absent or unreadable means anonymous.
    pub fn from_headers(headers: &HeaderMap, identity_header: &str) -> Identity {
        headers
            .get(identity_header)
            .and_then(|value| value.to_str().ok())
            .filter(|name| !name.is_empty())
            .map(|name| Identity::User(name.to_string()))
            .unwrap_or(Identity::Anonymous)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// The version-scoped authorization predicate, delegated to the
/// access-control subsystem.
#[async_trait]
pub trait ViewPolicy: Send + Sync {
    async fn can_view(&self, identity: &Identity, version: &Version) -> Result<bool, PolicyError>;
}

/// Terminal outcome of the access gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Redirect to a login endpoint that returns to the original URL.
    Challenge { location: Url },
    /// Authenticated but forbidden: a fixed 401, no redirect loop risk.
    Deny,
}

/// Picks the login endpoint for a challenge.
///
/// While a login-callback ticket is in flight, the challenge must resolve
/// through the service-facing endpoint: the externally visible hostname is
/// not reachable from inside the deployment during the callback phase.
/// Pure function of the request's own marker; shared configuration is never
/// mutated.
pub fn select_auth_endpoint(auth: &AuthConfig, has_ticket: bool) -> &Url {
    if has_ticket {
        &auth.internal_endpoint
    } else {
        &auth.external_endpoint
    }
}

pub async fn gate(
    policy: &dyn ViewPolicy,
    auth: &AuthConfig,
    identity: &Identity,
    version: &Version,
    original_url: &str,
    has_ticket: bool,
) -> Result<Access, PolicyError> {
    if policy.can_view(identity, version).await? {
        return Ok(Access::Allow);
    }

    if identity.is_anonymous() {
        let mut location = select_auth_endpoint(auth, has_ticket).clone();
        location
            .query_pairs_mut()
            .append_pair("next", original_url);
        return Ok(Access::Challenge { location });
    }

    Ok(Access::Deny)
}
