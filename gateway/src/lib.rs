//! Documentation gateway: resolves (host + path) to exactly one
//! project/version/file, enforces per-version viewing authorization, and
//! hands the file off to storage, either directly or through an internal
//! redirect for the edge proxy.

pub mod access;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod metrics_defs;
pub mod normalize;
pub mod policy;
pub mod resolver;
pub mod service;
pub mod storage;

use crate::access::ViewPolicy;
use crate::config::RegistryConfig;
use crate::policy::{RemotePolicy, StaticPolicy};
use crate::service::DocService;
use registry::{Catalog, Registry};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("invalid gateway configuration: {0}")]
    Validation(#[from] config::ValidationError),

    #[error("could not load project catalog: {0}")]
    Catalog(#[from] registry::CatalogError),

    #[error(transparent)]
    Serve(#[from] errors::ServeError),
}

pub async fn run(config: config::Config) -> Result<(), GatewayError> {
    config.validate()?;

    let registry = match &config.registry {
        RegistryConfig::Projects { path } => Registry::in_process(Catalog::from_file(path)?),
        RegistryConfig::Url { url } => Registry::remote(url.clone()),
    };

    let policy: Arc<dyn ViewPolicy> = match &config.auth.policy_endpoint {
        Some(endpoint) => Arc::new(RemotePolicy::new(endpoint.clone())),
        None => Arc::new(StaticPolicy),
    };

    let service = DocService::new(config.clone(), registry, policy);
    let doc_task = run_http_service(&config.listener.host, config.listener.port, service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, errors::ServeError>::new(|| true),
    );

    tokio::try_join!(doc_task, admin_task)?;
    Ok(())
}
