use crate::catalog::Catalog;
use crate::types::{Project, Relationship, Version};
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("registry returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("invalid registry URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A unified registry client that can work with either an in-process catalog
/// or a remote registry service via HTTP.
#[derive(Clone)]
pub struct Registry(RegistryInner);

impl Registry {
    pub fn in_process(catalog: Catalog) -> Self {
        Registry(RegistryInner::InProcess(Arc::new(catalog)))
    }

    pub fn remote(base_url: Url) -> Self {
        Registry(RegistryInner::Url(HttpClient::new(base_url)))
    }

    pub async fn project(&self, slug: &str) -> Result<Option<Project>, ClientError> {
        match &self.0 {
            RegistryInner::InProcess(catalog) => Ok(catalog.project(slug).cloned()),
            RegistryInner::Url(client) => client.get_json(&format!("projects/{slug}")).await,
        }
    }

    /// Subproject relationships with `parent`, in declaration order.
    pub async fn relationships(&self, parent: &str) -> Result<Vec<Relationship>, ClientError> {
        match &self.0 {
            RegistryInner::InProcess(catalog) => Ok(catalog
                .relationships(parent)
                .into_iter()
                .cloned()
                .collect()),
            RegistryInner::Url(client) => {
                let rels = client
                    .get_json(&format!("projects/{parent}/relationships"))
                    .await?;
                Ok(rels.unwrap_or_default())
            }
        }
    }

    /// The translation of `of` using `language`, if one exists.
    pub async fn translation(
        &self,
        of: &str,
        language: &str,
    ) -> Result<Option<Project>, ClientError> {
        match &self.0 {
            RegistryInner::InProcess(catalog) => Ok(catalog.translation(of, language).cloned()),
            RegistryInner::Url(client) => {
                client
                    .get_json(&format!("projects/{of}/translations/{language}"))
                    .await
            }
        }
    }

    pub async fn version(
        &self,
        project: &str,
        slug: &str,
    ) -> Result<Option<Version>, ClientError> {
        match &self.0 {
            RegistryInner::InProcess(catalog) => Ok(catalog.version(project, slug).cloned()),
            RegistryInner::Url(client) => {
                client
                    .get_json(&format!("projects/{project}/versions/{slug}"))
                    .await
            }
        }
    }
}

#[derive(Clone)]
enum RegistryInner {
    InProcess(Arc<Catalog>),
    Url(HttpClient),
}

#[derive(Clone)]
struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    fn new(base_url: Url) -> Self {
        HttpClient {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// GET a JSON resource relative to the base URL; 404 means "absent",
    /// not an error.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url.clone()).send().await?;
        tracing::debug!(%url, status = %response.status(), "registry lookup");

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(ClientError::UnexpectedStatus(status)),
        }
    }
}
