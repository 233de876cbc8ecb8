//! The doc-serving pipeline as a hyper `Service`.
//!
//! Each request is an independent, stateless unit of work: resolve the
//! slugs, normalize the path, locate the version, run the access gate, then
//! dispatch to storage. Every stage can short-circuit with a terminal
//! outcome; stages are ordered so a cheap check never runs after a more
//! expensive one.

use crate::access::{self, Access, ViewPolicy};
use crate::config::Config;
use crate::context::RequestContext;
use crate::dispatch::Dispatcher;
use crate::errors::{NotFoundReason, ServeError};
use crate::metrics_defs as defs;
use crate::normalize::{Normalized, normalize};
use crate::resolver;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use registry::Registry;
use shared::counter;
use shared::http::{full_body, make_boxed_error_response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const UNAUTHORIZED_PAGE: &str = "<!doctype html>\n<html>\n<head><title>401 Unauthorized</title></head>\n<body>\n<h1>401 Unauthorized</h1>\n<p>You are not authorized to view this documentation.</p>\n</body>\n</html>\n";

#[derive(Clone)]
pub struct DocService {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    registry: Registry,
    policy: Arc<dyn ViewPolicy>,
    dispatcher: Dispatcher,
}

impl DocService {
    pub fn new(config: Config, registry: Registry, policy: Arc<dyn ViewPolicy>) -> Self {
        let dispatcher = Dispatcher::from_config(&config.storage);
        DocService {
            inner: Arc::new(Inner {
                config,
                registry,
                policy,
                dispatcher,
            }),
        }
    }

    /// Runs the pipeline and maps the error taxonomy onto responses:
    /// `NotFound` is a 404 with the reason, everything else a 500.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<BoxBody<Bytes, Infallible>> {
        match self.serve(&req).await {
            Ok(response) => response,
            Err(ServeError::NotFound(reason)) => {
                tracing::info!(
                    reason = reason.as_str(),
                    path = req.uri().path(),
                    "not found"
                );
                counter!(defs::NOT_FOUND).increment(1);
                not_found_response(reason)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to serve documentation request");
                make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn serve<B>(
        &self,
        req: &Request<B>,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
        let inner = &self.inner;
        counter!(defs::REQUESTS).increment(1);

        let ctx = RequestContext::from_request(req, &inner.config)?;
        tracing::debug!(
            project = %ctx.project_slug,
            subproject = ?ctx.subproject_slug,
            lang = ?ctx.lang_slug,
            version = ?ctx.version_slug,
            filename = %ctx.filename,
            "doc request"
        );

        let project = resolver::resolve(
            &inner.registry,
            &ctx.project_slug,
            ctx.subproject_slug.as_deref(),
            ctx.lang_slug.as_deref(),
        )
        .await?;

        let normalized = normalize(
            &project,
            ctx.subproject_slug.as_deref(),
            ctx.page_filename.as_deref(),
            ctx.lang_slug.as_deref(),
            ctx.version_slug.as_deref(),
            &ctx.filename,
            ctx.query.as_deref(),
        )?;

        let (version_slug, filename) = match normalized {
            Normalized::Redirect { location } => {
                tracing::info!(project = %project.slug, location, "canonical root redirect");
                counter!(defs::CANONICAL_REDIRECTS).increment(1);
                return redirect_response(&location);
            }
            Normalized::Canonical {
                version_slug,
                filename,
                ..
            } => (version_slug, filename),
        };

        let version = inner
            .registry
            .version(&project.slug, &version_slug)
            .await?
            .ok_or(ServeError::NotFound(NotFoundReason::UnknownVersion))?;

        let outcome = access::gate(
            inner.policy.as_ref(),
            &inner.config.auth,
            &ctx.identity,
            &version,
            &ctx.original_url(),
            ctx.has_ticket(),
        )
        .await?;

        match outcome {
            Access::Allow => {}
            Access::Challenge { location } => {
                counter!(defs::AUTH_CHALLENGES).increment(1);
                return redirect_response(location.as_str());
            }
            Access::Deny => {
                tracing::debug!(project = %project.slug, "unauthorized access to documentation");
                counter!(defs::UNAUTHORIZED).increment(1);
                return unauthorized_response();
            }
        }

        counter!(defs::FILES_SERVED).increment(1);
        inner.dispatcher.dispatch(&project, &version, &filename).await
    }
}

impl Service<Request<Incoming>> for DocService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = ServeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

fn redirect_response(
    location: &str,
) -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location)
        .body(full_body(format!("Redirecting to {location}\n")))?)
}

fn not_found_response(reason: NotFoundReason) -> Response<BoxBody<Bytes, Infallible>> {
    let mut res = Response::new(full_body(format!("Not Found: {}\n", reason.as_str())));
    *res.status_mut() = StatusCode::NOT_FOUND;
    res
}

fn unauthorized_response() -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
    Ok(Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(CONTENT_TYPE, "text/html")
        .body(full_body(UNAUTHORIZED_PAGE))?)
}
