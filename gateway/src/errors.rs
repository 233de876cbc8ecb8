use crate::policy::PolicyError;
use crate::storage::StorageError;
use thiserror::Error;

/// Why a request resolved to nothing. Always surfaces as a 404 with the
/// reason logged, never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFoundReason {
    UnknownDomain,
    UnknownProject,
    InvalidSubproject,
    UnknownTranslation,
    IncompleteVersionPath,
    UnknownVersion,
    MissingFile,
}

impl NotFoundReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NotFoundReason::UnknownDomain => "unknown documentation domain",
            NotFoundReason::UnknownProject => "project does not exist",
            NotFoundReason::InvalidSubproject => "invalid subproject slug",
            NotFoundReason::UnknownTranslation => "no such translation",
            NotFoundReason::IncompleteVersionPath => "incomplete version path",
            NotFoundReason::UnknownVersion => "unknown version",
            NotFoundReason::MissingFile => "file does not exist",
        }
    }
}

/// Errors that can occur while serving a documentation request.
///
/// `NotFound` is terminal and maps to a 404; everything else is a transport
/// or internal failure and maps to a 500. Auth challenges and 401s are
/// controlled outcomes, not errors (see `access::Access`).
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("not found: {}", .0.as_str())]
    NotFound(NotFoundReason),

    #[error("registry lookup failed: {0}")]
    Registry(#[from] registry::ClientError),

    #[error("view policy call failed: {0}")]
    Policy(#[from] PolicyError),

    #[error("storage backend error: {0}")]
    Storage(StorageError),

    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
