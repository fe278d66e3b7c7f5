//! Error types shared by all bucket backends.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`StorageError`].
///
/// Callers that only need to branch on existence or retryability can
/// match on the kind instead of individual variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The key or another argument failed validation.
    InvalidArgument,
    /// The object does not exist.
    NotFound,
    /// An underlying I/O or encoding failure.
    Io,
    /// The governing cancellation signal fired.
    Cancelled,
    /// The operation has no meaningful implementation for this backend.
    NotImplemented,
}

/// Errors produced by bucket operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key fails character-set or structural validation, or targets
    /// the reserved sidecar suffix.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The resolved path does not exist on read, attribute lookup, or
    /// delete.
    #[error("object not found: {key:?}")]
    NotFound { key: String },

    /// Any other filesystem failure, wrapped with operation and key
    /// context. Not further subdivided.
    #[error("{op} {key:?}: {source}")]
    Io {
        op: &'static str,
        key: String,
        #[source]
        source: io::Error,
    },

    /// The bucket root is missing or not a directory at construction.
    #[error("bucket root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// The attribute record could not be encoded or decoded.
    #[error("attribute record for {key:?}: {reason}")]
    Codec { key: String, reason: String },

    /// The write's cancellation token was triggered before close.
    #[error("operation cancelled")]
    Cancelled,

    /// The write's deadline passed before close.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// No meaningful implementation exists for this backend.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl StorageError {
    /// The coarse [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKey { .. } | Self::InvalidRoot { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } | Self::Codec { .. } => ErrorKind::Io,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    /// True when the error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias for bucket operations.
pub type StorageResult<T> = Result<T, StorageError>;
