//! Storage backend capability: given a logical path, either stream bytes or
//! produce a time-limited signed URL.
//!
//! Backends own their own retry/backoff; the gateway performs none. A read
//! handle lives only for the single response being written.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use http::StatusCode;
use sha2::Sha256;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage HTTP error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("storage returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("invalid storage URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("this backend does not support signed URLs")]
    SigningUnsupported,
}

#[async_trait]
pub trait DocStorage: Send + Sync {
    /// Stream the object's bytes; `NotFound` if it does not exist.
    async fn read(&self, path: &str) -> Result<Bytes, StorageError>;

    /// Produce a time-limited signed URL granting read access to the object.
    async fn sign(&self, path: &str) -> Result<Url, StorageError>;
}

/// Serves objects from a local directory. Backs direct mode; signing is a
/// bucket concern and unsupported here.
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl DocStorage for FilesystemStorage {
    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        // Logical paths never leave the storage root
        if path.split('/').any(|segment| segment == "..") || path.contains('\0') {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let full_path = self.root.join(path.trim_start_matches('/'));
        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn sign(&self, _path: &str) -> Result<Url, StorageError> {
        Err(StorageError::SigningUnsupported)
    }
}

/// Private bucket reached over HTTP; reads authorize via the same signed
/// query the edge proxy uses.
pub struct SignedBucketStorage {
    client: reqwest::Client,
    base_url: Url,
    secret: String,
    ttl: Duration,
}

impl SignedBucketStorage {
    pub fn new(base_url: Url, secret: String, ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret,
            ttl,
        }
    }

    fn object_url(&self, path: &str) -> Result<Url, StorageError> {
        // Url::join percent-encodes any non-ASCII path characters
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn signature(&self, url_path: &str, expires: u64) -> Result<String, StorageError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|err| StorageError::Signing(err.to_string()))?;
        mac.update(url_path.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl DocStorage for SignedBucketStorage {
    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        let url = self.sign(path).await?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(path.to_string())),
            status if status.is_success() => Ok(response.bytes().await?),
            status => Err(StorageError::UnexpectedStatus(status)),
        }
    }

    async fn sign(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.object_url(path)?;

        let expires = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| StorageError::Signing(err.to_string()))?
            .as_secs()
            + self.ttl.as_secs();
        let signature = self.signature(url.path(), expires)?;

        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filesystem_read() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("html/acme/latest");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("index.html"), b"<h1>docs</h1>").unwrap();

        let storage = FilesystemStorage::new(dir.path().to_path_buf());

        let data = storage.read("html/acme/latest/index.html").await.unwrap();
        assert_eq!(data.as_ref(), b"<h1>docs</h1>");

        assert!(matches!(
            storage.read("html/acme/latest/missing.html").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.read("html/../../etc/passwd").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.sign("html/acme/latest/index.html").await,
            Err(StorageError::SigningUnsupported)
        ));
    }

    #[tokio::test]
    async fn test_signed_url_shape() {
        let storage = SignedBucketStorage::new(
            Url::parse("http://storage.internal/media/").unwrap(),
            "super-secret".to_string(),
            Duration::from_secs(3600),
        );

        let url = storage.sign("html/acme/latest/index.html").await.unwrap();
        assert_eq!(url.path(), "/media/html/acme/latest/index.html");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "expires");
        assert_eq!(pairs[1].0, "signature");

        // Signature is URL-safe base64, no padding
        assert!(
            pairs[1]
                .1
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        );

        // Expiry is in the future
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let expires: u64 = pairs[0].1.parse().unwrap();
        assert!(expires > now);
    }

    #[tokio::test]
    async fn test_signed_url_encodes_non_ascii_paths() {
        let storage = SignedBucketStorage::new(
            Url::parse("http://storage.internal/media/").unwrap(),
            "super-secret".to_string(),
            Duration::from_secs(60),
        );

        let url = storage.sign("html/acme/latest/über.html").await.unwrap();
        assert!(url.path().is_ascii());
        assert!(url.path().contains("%C3%BC"));
    }

    #[tokio::test]
    async fn test_signature_is_path_dependent() {
        let storage = SignedBucketStorage::new(
            Url::parse("http://storage.internal/media/").unwrap(),
            "super-secret".to_string(),
            Duration::from_secs(60),
        );

        let a = storage.signature("/media/a.html", 1_000_000).unwrap();
        let b = storage.signature("/media/b.html", 1_000_000).unwrap();
        let a_later = storage.signature("/media/a.html", 1_000_001).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, a_later);
        assert_eq!(a, storage.signature("/media/a.html", 1_000_000).unwrap());
    }
}
