//! Sequential and ranged reads over stored objects.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use blobfs_core::{BlobReader, ReaderAttributes, StorageResult};

/// A reader over a stored object, optionally restricted to a byte range.
///
/// Attributes are captured at open time and never re-read. Dropping the
/// reader releases the file handle, so the handle is released on every
/// exit path whether or not `close` is called.
pub struct FileReader {
    inner: io::Take<File>,
    attrs: ReaderAttributes,
}

impl FileReader {
    /// Position `file` at `offset` and bound it to `length` bytes
    /// (unbounded when `None`). Seeking past the end is not an error;
    /// subsequent reads simply return no bytes.
    pub(crate) fn open(
        mut file: File,
        offset: u64,
        length: Option<u64>,
        attrs: ReaderAttributes,
    ) -> io::Result<Self> {
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(Self {
            inner: file.take(length.unwrap_or(u64::MAX)),
            attrs,
        })
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BlobReader for FileReader {
    fn attrs(&self) -> &ReaderAttributes {
        &self.attrs
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        // Dropping the handle is the release; a read-only handle has
        // nothing to flush.
        Ok(())
    }
}
