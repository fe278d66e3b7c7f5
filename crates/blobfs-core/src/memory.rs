//! In-memory bucket for testing and ephemeral use.
//!
//! [`InMemoryBucket`] keeps blobs in a `BTreeMap` behind an `RwLock`. It
//! implements the full [`Bucket`] trait and is suitable for unit tests,
//! embedding, and short-lived processes. Data is lost when the bucket is
//! dropped.

use std::any::Any;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use crate::cancel::CancelToken;
use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobReader, BlobWriter, Bucket};
use crate::types::{
    BlobAttrs, HandleProbe, ListOptions, ListPage, ObjectAttributes, ObjectSummary,
    ReaderAttributes, WriteOptions, DEFAULT_PAGE_SIZE,
};

/// A blob held by the in-memory bucket.
#[derive(Clone, Debug)]
struct StoredBlob {
    data: Vec<u8>,
    attrs: BlobAttrs,
    mod_time: SystemTime,
}

type BlobMap = Arc<RwLock<BTreeMap<String, StoredBlob>>>;

/// An in-memory implementation of [`Bucket`].
///
/// Keys are not restricted to the file backend's character set; those
/// rules exist to keep keys unambiguous as filesystem paths, which has
/// no analogue here. Empty keys are rejected. Listing and pagination
/// semantics match the file backend.
#[derive(Debug, Default)]
pub struct InMemoryBucket {
    blobs: BlobMap,
}

impl InMemoryBucket {
    /// Create a new empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the bucket holds no objects.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

struct MemReader {
    data: io::Cursor<Vec<u8>>,
    attrs: ReaderAttributes,
}

impl Read for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl BlobReader for MemReader {
    fn attrs(&self) -> &ReaderAttributes {
        &self.attrs
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

struct MemWriter {
    blobs: BlobMap,
    key: String,
    buf: Vec<u8>,
    attrs: BlobAttrs,
    cancel: CancelToken,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BlobWriter for MemWriter {
    fn close(self: Box<Self>) -> StorageResult<()> {
        // A cancelled write stores nothing at all.
        self.cancel.check()?;
        let this = *self;
        let mut blobs = this.blobs.write().expect("lock poisoned");
        blobs.insert(
            this.key,
            StoredBlob {
                data: this.buf,
                attrs: this.attrs,
                mod_time: SystemTime::now(),
            },
        );
        Ok(())
    }
}

impl Bucket for InMemoryBucket {
    fn attributes(&self, key: &str) -> StorageResult<ObjectAttributes> {
        let blobs = self.blobs.read().expect("lock poisoned");
        let blob = blobs.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        Ok(ObjectAttributes {
            content_type: blob.attrs.content_type.clone(),
            metadata: blob.attrs.metadata.clone(),
            mod_time: blob.mod_time,
            size: blob.data.len() as u64,
        })
    }

    fn reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<Box<dyn BlobReader>> {
        let blobs = self.blobs.read().expect("lock poisoned");
        let blob = blobs.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        let attrs = ReaderAttributes {
            content_type: blob.attrs.content_type.clone(),
            mod_time: blob.mod_time,
            size: blob.data.len() as u64,
        };
        // Reads past the end behave like a seek past EOF: empty.
        let start = (offset as usize).min(blob.data.len());
        let mut window = blob.data[start..].to_vec();
        if let Some(limit) = length {
            window.truncate(limit as usize);
        }
        Ok(Box::new(MemReader {
            data: io::Cursor::new(window),
            attrs,
        }))
    }

    fn writer(
        &self,
        key: &str,
        content_type: &str,
        opts: WriteOptions,
    ) -> StorageResult<Box<dyn BlobWriter>> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: String::new(),
                reason: "empty key".to_string(),
            });
        }
        if let Some(hook) = opts.before_write {
            hook(&HandleProbe::unsupported())?;
        }
        Ok(Box::new(MemWriter {
            blobs: Arc::clone(&self.blobs),
            key: key.to_string(),
            buf: Vec::new(),
            attrs: BlobAttrs::new(content_type, opts.metadata),
            cancel: opts.cancel,
        }))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.write().expect("lock poisoned");
        if blobs.remove(key).is_none() {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn list(&self, opts: &ListOptions) -> StorageResult<ListPage> {
        let blobs = self.blobs.read().expect("lock poisoned");
        let page_size = if opts.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            opts.page_size
        };
        let mut page = ListPage::default();
        for (name, blob) in blobs.iter() {
            if !opts.prefix.is_empty() && !name.starts_with(&opts.prefix) {
                continue;
            }
            if let Some(token) = &opts.page_token {
                if name.as_str() < token.as_str() {
                    continue;
                }
            }
            if page.objects.len() == page_size {
                page.next_page_token = Some(name.clone());
                break;
            }
            page.objects.push(ObjectSummary {
                key: name.clone(),
                mod_time: blob.mod_time,
                size: blob.data.len() as u64,
            });
        }
        Ok(page)
    }

    fn signed_url(&self, _key: &str, _expiry: Duration) -> StorageResult<String> {
        Err(StorageError::NotImplemented("signed URLs"))
    }

    fn native_handle(&self) -> Option<&dyn Any> {
        None
    }
}
