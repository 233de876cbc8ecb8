//! Per-request context.
//!
//! Created at request entry and dropped at response emission; never
//! persisted. Everything downstream (resolver, normalizer, gate) works off
//! this parsed form instead of the raw request.

use crate::access::Identity;
use crate::config::Config;
use crate::errors::{NotFoundReason, ServeError};
use hyper::Request;
use hyper::header::HOST;
use percent_encoding::percent_decode_str;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    /// Project slug derived from the host.
    pub project_slug: String,
    pub subproject_slug: Option<String>,
    pub lang_slug: Option<String>,
    pub version_slug: Option<String>,
    /// Filename from a `page/` shortcut path, to be redirected into the
    /// default version.
    pub page_filename: Option<String>,
    /// Path remainder, decoded, trailing slash preserved.
    pub filename: String,
    /// Raw query string, preserved verbatim for redirects.
    pub query: Option<String>,
    pub identity: Identity,
    scheme: String,
    host: String,
    path_and_query: String,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>, config: &Config) -> Result<Self, ServeError> {
        let host = req
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host())
            .ok_or(ServeError::NotFound(NotFoundReason::UnknownDomain))?
            .to_string();

        let project_slug = project_slug_from_host(&host, &config.public_domain)
            .ok_or(ServeError::NotFound(NotFoundReason::UnknownDomain))?;

        let raw_path = req.uri().path();
        let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
        let doc_path = parse_doc_path(&decoded);

        let scheme = req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("https")
            .to_string();

        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| raw_path.to_string());

        Ok(RequestContext {
            project_slug,
            subproject_slug: doc_path.subproject_slug,
            lang_slug: doc_path.lang_slug,
            version_slug: doc_path.version_slug,
            page_filename: doc_path.page_filename,
            filename: doc_path.filename,
            query: req.uri().query().map(str::to_string),
            identity: Identity::from_headers(req.headers(), &config.auth.identity_header),
            scheme,
            host,
            path_and_query,
        })
    }

    /// The original absolute URL, query string included. Used as the
    /// post-login return target.
    pub fn original_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path_and_query)
    }

    /// Whether the request carries a login-callback ticket.
    pub fn has_ticket(&self) -> bool {
        self.query
            .as_deref()
            .is_some_and(|query| {
                query
                    .split('&')
                    .any(|pair| pair.split_once('=').map(|(k, _)| k).unwrap_or(pair) == "ticket")
            })
    }
}

/// Derives the project slug from the host: `acme.docs.example.com` under
/// public domain `docs.example.com` is project `acme`. Custom domains are
/// out of scope; anything else is a miss.
pub fn project_slug_from_host(host: &str, public_domain: &str) -> Option<String> {
    let host = host.split(':').next().unwrap_or(host);
    let slug = host
        .strip_suffix(public_domain)?
        .strip_suffix('.')?;
    if slug.is_empty() || slug.contains('.') {
        return None;
    }
    Some(slug.to_ascii_lowercase())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocPath {
    pub subproject_slug: Option<String>,
    pub lang_slug: Option<String>,
    pub version_slug: Option<String>,
    pub page_filename: Option<String>,
    pub filename: String,
}

/// Splits a request path into subproject / language / version / filename.
///
/// Subprojects live under a `projects/<slug>/` prefix. A `page/` prefix
/// marks a version-less page shortcut that redirects into the default
/// version. A language/version pair is only recognized when the first
/// segment looks like a language code and a second segment follows;
/// otherwise the whole remainder is the filename and the normalizer decides
/// what that means for the project.
pub fn parse_doc_path(path: &str) -> DocPath {
    let mut rest = path.strip_prefix('/').unwrap_or(path);

    let mut subproject_slug = None;
    if let Some(after) = rest.strip_prefix("projects/") {
        match after.split_once('/') {
            Some((slug, tail)) => {
                subproject_slug = Some(slug.to_string());
                rest = tail;
            }
            None => {
                subproject_slug = Some(after.to_string());
                rest = "";
            }
        }
    }

    if let Some(after) = rest.strip_prefix("page/") {
        return DocPath {
            subproject_slug,
            page_filename: Some(after.to_string()),
            ..DocPath::default()
        };
    }

    let mut parts = rest.splitn(3, '/');
    if let (Some(first), Some(second)) = (parts.next(), parts.next())
        && looks_like_language(first)
        && !second.is_empty()
    {
        return DocPath {
            subproject_slug,
            lang_slug: Some(first.to_string()),
            version_slug: Some(second.to_string()),
            page_filename: None,
            filename: parts.next().unwrap_or("").to_string(),
        };
    }

    DocPath {
        subproject_slug,
        lang_slug: None,
        version_slug: None,
        page_filename: None,
        filename: rest.to_string(),
    }
}

fn looks_like_language(s: &str) -> bool {
    fn base(part: &str) -> bool {
        (2..=3).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_lowercase())
    }
    match s.split_once('-') {
        None => base(s),
        Some((lang, region)) => {
            base(lang)
                && (2..=4).contains(&region.len())
                && region
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        }
    }
}
