//! Storage abstraction boundary for blobfs.
//!
//! This crate defines the [`Bucket`] trait that storage backends plug
//! into, together with the shared error taxonomy, the attribute and
//! listing data model, and cooperative cancellation for writes. The
//! local-filesystem backend lives in `blobfs-local`; an in-memory
//! backend for tests and embedding ships here.
//!
//! # Key pieces
//!
//! - [`Bucket`], [`BlobReader`], [`BlobWriter`] — the backend interface
//! - [`StorageError`] / [`ErrorKind`] — the error taxonomy shared by all
//!   backends
//! - [`BlobAttrs`], [`ObjectAttributes`], [`ObjectSummary`], [`ListPage`]
//!   — the data model
//! - [`CancelToken`] — cooperative cancellation, consulted at write close
//! - [`InMemoryBucket`] — map-backed bucket for tests and embedding
//!
//! # Design rules
//!
//! 1. Exactly one canonical object corresponds to any valid key.
//! 2. Payload and attributes become observable together; a reader never
//!    sees attributes for an incomplete payload.
//! 3. Backends hold no cache of object state between calls.
//! 4. Errors carry operation and key context and are never silently
//!    swallowed.
//! 5. No operation is retried internally; retry policy belongs to the
//!    caller.

pub mod cancel;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

// Re-export primary types at crate root for ergonomic imports.
pub use cancel::CancelToken;
pub use error::{ErrorKind, StorageError, StorageResult};
pub use memory::InMemoryBucket;
pub use traits::{BlobReader, BlobWriter, Bucket};
pub use types::{
    BeforeWrite, BlobAttrs, HandleProbe, ListOptions, ListPage, ObjectAttributes, ObjectSummary,
    ReaderAttributes, WriteOptions, DEFAULT_PAGE_SIZE,
};
