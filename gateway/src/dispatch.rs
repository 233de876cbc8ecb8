//! Storage dispatch: the last pipeline stage. Builds the logical storage
//! path and either streams the file or emits an internal-redirect response
//! for the edge proxy.

use crate::config::StorageConfig;
use crate::errors::{NotFoundReason, ServeError};
use crate::storage::{DocStorage, FilesystemStorage, SignedBucketStorage, StorageError};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{CONTENT_ENCODING, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use registry::{Project, Version};
use shared::http::full_body;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

/// ASCII characters that must not appear raw in a header value; everything
/// outside the ASCII range is always encoded.
const HEADER_UNSAFE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Re-encodes an internationalized path as an ASCII-safe URI. The edge
/// proxy's header parser rejects non-ASCII bytes.
pub fn iri_to_uri(path: &str) -> String {
    utf8_percent_encode(path, HEADER_UNSAFE).to_string()
}

/// Joins the version's storage root and the request filename. A trailing
/// slash completes to `index.html`; exact path or trailing slash is the
/// whole contract, there is no probing for alternate index files.
pub fn storage_path(project: &Project, version: &Version, filename: &str) -> String {
    let root = project.storage_root(&version.slug);
    let mut path = format!("{}/{}", root.trim_end_matches('/'), filename);
    if path.ends_with('/') {
        path.push_str("index.html");
    }
    path
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ServingMode {
    Direct,
    InternalRedirect { location: String },
}

pub struct Dispatcher {
    storage: Arc<dyn DocStorage>,
    mode: ServingMode,
}

impl Dispatcher {
    pub fn from_config(config: &StorageConfig) -> Self {
        match config {
            StorageConfig::Direct { root } => Dispatcher {
                storage: Arc::new(FilesystemStorage::new(root.clone())),
                mode: ServingMode::Direct,
            },
            StorageConfig::InternalRedirect {
                base_url,
                secret,
                ttl_secs,
                location,
            } => Dispatcher {
                storage: Arc::new(SignedBucketStorage::new(
                    base_url.clone(),
                    secret.clone(),
                    Duration::from_secs(*ttl_secs),
                )),
                mode: ServingMode::InternalRedirect {
                    location: location.clone(),
                },
            },
        }
    }

    pub async fn dispatch(
        &self,
        project: &Project,
        version: &Version,
        filename: &str,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
        let path = storage_path(project, version, filename);
        match &self.mode {
            ServingMode::Direct => self.serve_direct(&path, project).await,
            ServingMode::InternalRedirect { location } => {
                self.serve_internal_redirect(&path, location, project).await
            }
        }
    }

    async fn serve_direct(
        &self,
        path: &str,
        project: &Project,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
        let bytes = match self.storage.read(path).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                return Err(ServeError::NotFound(NotFoundReason::MissingFile));
            }
            Err(err) => return Err(ServeError::Storage(err)),
        };

        tracing::info!(path, project = %project.slug, "serving file directly");

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, guess_content_type(path))
            .body(full_body(bytes))?)
    }

    async fn serve_internal_redirect(
        &self,
        path: &str,
        location: &str,
        project: &Project,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>, ServeError> {
        let signed = match self.storage.sign(path).await {
            Ok(url) => url,
            Err(StorageError::NotFound(_)) => {
                return Err(ServeError::NotFound(NotFoundReason::MissingFile));
            }
            Err(err) => return Err(ServeError::Storage(err)),
        };

        // The signature must travel, the absolute URL must not: the edge
        // proxy reaches the backend over an internal, trusted channel, so
        // only path and query survive.
        let stripped = match signed.query() {
            Some(query) => format!("{}?{}", signed.path(), query),
            None => signed.path().to_string(),
        };
        let internal_path = format!("{location}{}", stripped.trim_matches('/'));

        tracing::info!(path = %internal_path, project = %project.slug, "serving via internal redirect");

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, guess_content_type(path))
            .header("x-accel-redirect", iri_to_uri(&internal_path));
        if let Some(encoding) = guess_content_encoding(path) {
            // For the edge proxy and browser to interpret the resource it
            // fetches next; the diagnostic body itself is plain text.
            builder = builder.header(CONTENT_ENCODING, encoding);
        }

        Ok(builder.body(full_body(format!("Serving internal path: {internal_path}\n")))?)
    }
}

/// Content type from the file extension; unknown extensions default to
/// `application/octet-stream`. Compression suffixes are stripped first so
/// `page.html.gz` still reports `text/html`.
pub fn guess_content_type(path: &str) -> &'static str {
    let path = match encoding_extension(path) {
        Some(_) => path.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(path),
        None => path,
    };
    match extension(path) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") | Some("map") => "application/json",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("epub") => "application/epub+zip",
        Some("zip") => "application/zip",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("eot") => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}

/// Content encoding implied by a compression suffix, if any.
pub fn guess_content_encoding(path: &str) -> Option<&'static str> {
    encoding_extension(path)
}

fn encoding_extension(path: &str) -> Option<&'static str> {
    match extension(path) {
        Some("gz") => Some("gzip"),
        Some("bz2") => Some("bzip2"),
        Some("xz") => Some("xz"),
        _ => None,
    }
}

fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}
