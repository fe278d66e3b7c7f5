//! Data model shared by bucket backends: attribute records, list pages,
//! and write options.

use std::any::Any;
use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::StorageResult;

/// Default number of entries per list page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Per-object attribute record: content type plus user metadata.
///
/// This is the unit backends persist alongside the payload (the file
/// backend uses a JSON sidecar file). A missing record decodes to the
/// default: empty content type, no metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobAttrs {
    /// MIME content type. May be empty.
    #[serde(default)]
    pub content_type: String,
    /// User-supplied string metadata. Keys are unique; `BTreeMap` keeps
    /// the serialized form deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl BlobAttrs {
    /// Build a record from a content type and metadata map.
    pub fn new(content_type: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content_type: content_type.into(),
            metadata,
        }
    }
}

/// Full attributes of a stored object, as returned by
/// [`Bucket::attributes`](crate::traits::Bucket::attributes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectAttributes {
    /// MIME content type recorded at write time.
    pub content_type: String,
    /// User metadata recorded at write time.
    pub metadata: BTreeMap<String, String>,
    /// Payload modification time.
    pub mod_time: SystemTime,
    /// Payload size in bytes.
    pub size: u64,
}

/// Attributes captured by a reader at open time. They are not re-read
/// per byte; a concurrent overwrite is not reflected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderAttributes {
    /// MIME content type recorded at write time.
    pub content_type: String,
    /// Payload modification time when the reader was opened.
    pub mod_time: SystemTime,
    /// Payload size when the reader was opened.
    pub size: u64,
}

/// One entry of a list page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object name.
    pub key: String,
    /// Modification time.
    pub mod_time: SystemTime,
    /// Size in bytes.
    pub size: u64,
}

/// Options for [`Bucket::list`](crate::traits::Bucket::list).
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Plain string-prefix filter on object names. Empty means no filter.
    pub prefix: String,
    /// Continuation cursor from a previous page's `next_page_token`.
    /// Entries sorting lexicographically below the token are skipped.
    pub page_token: Option<String>,
    /// Maximum entries per page; `0` selects [`DEFAULT_PAGE_SIZE`].
    pub page_size: usize,
}

/// One page of list results.
#[derive(Clone, Debug, Default)]
pub struct ListPage {
    /// Summaries sorted by name.
    pub objects: Vec<ObjectSummary>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Probe handed to the before-write hook for introspecting the backend's
/// native writable handle. Neither shipped backend exposes one.
pub struct HandleProbe<'a> {
    native: Option<&'a dyn Any>,
}

impl<'a> HandleProbe<'a> {
    /// A probe with no native handle behind it.
    pub fn unsupported() -> Self {
        Self { native: None }
    }

    /// A probe exposing a backend-specific handle.
    pub fn with_native(native: &'a dyn Any) -> Self {
        Self {
            native: Some(native),
        }
    }

    /// The backend-specific handle, if the backend exposes one.
    pub fn native_handle(&self) -> Option<&'a dyn Any> {
        self.native
    }
}

/// Hook invoked after the destination is staged but before the writer is
/// handed out. Returning `Err` aborts the write.
pub type BeforeWrite = Box<dyn FnOnce(&HandleProbe<'_>) -> StorageResult<()> + Send>;

/// Options accepted by [`Bucket::writer`](crate::traits::Bucket::writer).
#[derive(Default)]
pub struct WriteOptions {
    /// User metadata persisted with the object on successful close.
    pub metadata: BTreeMap<String, String>,
    /// Optional hook run before the writer is handed out.
    pub before_write: Option<BeforeWrite>,
    /// Cancellation signal consulted at close.
    pub cancel: CancelToken,
}

impl WriteOptions {
    /// Options with the given metadata and no hook or cancellation.
    pub fn with_metadata(metadata: BTreeMap<String, String>) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Options governed by the given cancellation token.
    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }
}
