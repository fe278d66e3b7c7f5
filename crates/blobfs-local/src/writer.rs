//! Staged writes with cancellation-safe cleanup.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::warn;

use blobfs_core::{BlobAttrs, BlobWriter, CancelToken, StorageError, StorageResult};

use crate::sidecar;

/// An in-progress write of a single object.
///
/// Payload bytes go to the destination file as they arrive; the
/// attribute record is persisted only at close, after the payload is
/// complete, so a reader can never observe attributes for a partial
/// payload. If the governing [`CancelToken`] has fired by close time,
/// the partial file is removed and the cancellation error surfaced.
/// A writer dropped without closing also removes its partial file.
pub struct FileWriter {
    /// `None` once the write has been finalized or discarded.
    file: Option<File>,
    path: PathBuf,
    key: String,
    attrs: BlobAttrs,
    cancel: CancelToken,
}

impl FileWriter {
    pub(crate) fn new(
        file: File,
        path: PathBuf,
        key: String,
        attrs: BlobAttrs,
        cancel: CancelToken,
    ) -> Self {
        Self {
            file: Some(file),
            path,
            key,
            attrs,
            cancel,
        }
    }

    /// Drop the handle and best-effort remove the partial payload.
    /// Failure to remove is logged, not reported: the primary error
    /// being surfaced to the caller takes precedence.
    fn discard(&mut self) {
        // Release the handle first so the unlink works on platforms
        // that refuse to delete open files.
        self.file.take();
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(key = %self.key, error = %e, "failed to remove partial object");
            }
        }
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "write on a finalized writer",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl BlobWriter for FileWriter {
    fn close(mut self: Box<Self>) -> StorageResult<()> {
        // Cancellation is consulted here and only here; a write already
        // in flight is not interrupted.
        if let Err(cancelled) = self.cancel.check() {
            self.discard();
            return Err(cancelled);
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                return Err(StorageError::Io {
                    op: "flush object",
                    key: self.key.clone(),
                    source: e,
                });
            }
        }
        // Payload is complete; only now may the record become visible.
        // On failure the drop guard removes the partial object.
        sidecar::write_attrs(&self.path, &self.key, &self.attrs)?;
        self.file.take();
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        // A writer abandoned before close leaves no partial file behind.
        if self.file.is_some() {
            self.discard();
        }
    }
}
