//! `ViewPolicy` implementations.
//!
//! The gateway does not encode authorization rules; it asks a policy for a
//! yes/no per (identity, version). `StaticPolicy` answers from the version
//! record itself and backs in-process deployments and tests;
//! `RemotePolicy` defers to an authorization service over HTTP.

use crate::access::{Identity, ViewPolicy};
use async_trait::async_trait;
use http::StatusCode;
use registry::Version;
use serde::Deserialize;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum PolicyError {
    #[error("policy service error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("policy service returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Public versions are visible to everyone; private versions only to
/// identities on the version's viewer list.
pub struct StaticPolicy;

#[async_trait]
impl ViewPolicy for StaticPolicy {
    async fn can_view(&self, identity: &Identity, version: &Version) -> Result<bool, PolicyError> {
        if !version.private {
            return Ok(true);
        }
        match identity {
            Identity::Anonymous => Ok(false),
            Identity::User(name) => Ok(version.viewers.iter().any(|viewer| viewer == name)),
        }
    }
}

/// Asks a remote authorization service. A non-2xx answer is a transport
/// error, never a silent deny.
pub struct RemotePolicy {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemotePolicy {
    pub fn new(endpoint: Url) -> Self {
        RemotePolicy {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[derive(Deserialize)]
struct Decision {
    allowed: bool,
}

#[async_trait]
impl ViewPolicy for RemotePolicy {
    async fn can_view(&self, identity: &Identity, version: &Version) -> Result<bool, PolicyError> {
        let mut query = vec![
            ("project", version.project.as_str()),
            ("version", version.slug.as_str()),
        ];
        if let Identity::User(name) = identity {
            query.push(("user", name.as_str()));
        }

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PolicyError::UnexpectedStatus(response.status()));
        }

        let decision: Decision = response.json().await?;
        Ok(decision.allowed)
    }
}
