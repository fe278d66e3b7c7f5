//! The [`Bucket`] trait defining the object-storage interface, plus the
//! reader and writer traits backends hand out.
//!
//! Any backend (local filesystem, in-memory, a networked service)
//! implements these traits to plug into the storage abstraction.

use std::any::Any;
use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{StorageError, StorageResult};
use crate::types::{ListOptions, ListPage, ObjectAttributes, ReaderAttributes, WriteOptions};

/// An open blob handed out by [`Bucket::reader`].
pub trait BlobReader: Read + Send {
    /// Attributes captured when the reader was opened.
    fn attrs(&self) -> &ReaderAttributes;

    /// Release the underlying handle.
    ///
    /// Consuming the reader makes read-after-close unrepresentable;
    /// dropping without closing also releases the handle.
    fn close(self: Box<Self>) -> StorageResult<()>;

    /// Backend-specific escape hatch; `None` when the backend has
    /// nothing to expose.
    fn native_handle(&self) -> Option<&dyn Any> {
        None
    }
}

/// An in-progress write handed out by [`Bucket::writer`].
pub trait BlobWriter: Write + Send {
    /// Finish the write.
    ///
    /// If the governing [`CancelToken`](crate::cancel::CancelToken) has
    /// fired, the partial object is removed and the cancellation error
    /// returned. Otherwise the attribute record is persisted after the
    /// payload, so the object becomes observable as a unit.
    fn close(self: Box<Self>) -> StorageResult<()>;
}

/// An object-storage bucket.
///
/// All implementations must satisfy these invariants:
/// - Exactly one canonical object corresponds to any valid key.
/// - An object's payload and attributes appear and disappear together
///   under normal (non-cancelled) completion.
/// - No operation retries internally; retry policy belongs to the caller.
/// - Errors carry operation and key context and are never silently
///   swallowed.
pub trait Bucket: Send + Sync {
    /// Look up content type, metadata, modification time, and size.
    fn attributes(&self, key: &str) -> StorageResult<ObjectAttributes>;

    /// Open a reader over `[offset, offset + length)`, or from `offset`
    /// to the end when `length` is `None`.
    fn reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<Box<dyn BlobReader>>;

    /// Open a writer that will persist `content_type` and the options'
    /// metadata when closed successfully.
    fn writer(
        &self,
        key: &str,
        content_type: &str,
        opts: WriteOptions,
    ) -> StorageResult<Box<dyn BlobWriter>>;

    /// Remove an object and its attributes.
    ///
    /// Returns [`StorageError::NotFound`] when the object is absent;
    /// absence of the attribute record alone is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Enumerate objects in stable name order, one page per call.
    fn list(&self, opts: &ListOptions) -> StorageResult<ListPage>;

    /// Produce a URL granting temporary access to an object.
    ///
    /// Backends without a meaningful equivalent return
    /// [`StorageError::NotImplemented`].
    fn signed_url(&self, key: &str, expiry: Duration) -> StorageResult<String>;

    /// Backend-specific escape hatch; `None` when the backend has
    /// nothing to expose.
    fn native_handle(&self) -> Option<&dyn Any> {
        None
    }

    /// Read an entire object into memory.
    ///
    /// Default implementation composes [`Bucket::reader`]. Backends may
    /// override to skip the handle round-trip.
    fn read_all(&self, key: &str) -> StorageResult<Vec<u8>> {
        let mut reader = self.reader(key, 0, None)?;
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            return Err(StorageError::Io {
                op: "read object",
                key: key.to_string(),
                source: e,
            });
        }
        reader.close()?;
        Ok(buf)
    }

    /// Write an entire object in one call.
    ///
    /// Default implementation composes [`Bucket::writer`].
    fn write_all(
        &self,
        key: &str,
        content_type: &str,
        data: &[u8],
        opts: WriteOptions,
    ) -> StorageResult<()> {
        let mut writer = self.writer(key, content_type, opts)?;
        if let Err(e) = writer.write_all(data) {
            return Err(StorageError::Io {
                op: "write object",
                key: key.to_string(),
                source: e,
            });
        }
        writer.close()
    }
}
