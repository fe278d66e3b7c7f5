//! The [`FileBucket`] facade: key resolution, sidecar attributes,
//! readers, writers, deletion, and paged listing over one root
//! directory.

use std::any::Any;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use blobfs_core::{
    BlobAttrs, BlobReader, BlobWriter, Bucket, HandleProbe, ListOptions, ListPage,
    ObjectAttributes, ObjectSummary, ReaderAttributes, StorageError, StorageResult, WriteOptions,
    DEFAULT_PAGE_SIZE,
};

use crate::path::resolve_path;
use crate::reader::FileReader;
use crate::sidecar::{self, ATTRS_EXT};
use crate::writer::FileWriter;

/// A bucket backed by a directory on the local filesystem.
///
/// The root is fixed at construction and must already exist; it is not
/// created. The bucket keeps no state besides the root path, so every
/// operation re-reads the filesystem and instances are cheap to clone.
#[derive(Clone, Debug)]
pub struct FileBucket {
    root: PathBuf,
}

impl FileBucket {
    /// Open a bucket over an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|e| StorageError::InvalidRoot {
            path: root.clone(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(StorageError::InvalidRoot {
                path: root,
                reason: "not a directory".to_string(),
            });
        }
        Ok(Self { root })
    }

    /// The bucket root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its absolute path, rejecting keys that target
    /// the reserved sidecar extension.
    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        let rel = resolve_path(key)?;
        if key.ends_with(ATTRS_EXT) {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: format!("extension {ATTRS_EXT:?} is reserved"),
            });
        }
        Ok(self.root.join(rel))
    }

    /// Path, stat, and attribute record for an existing object.
    fn for_key(&self, key: &str) -> StorageResult<(PathBuf, fs::Metadata, BlobAttrs)> {
        let path = self.object_path(key)?;
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => {
                return Err(StorageError::Io {
                    op: "stat object",
                    key: key.to_string(),
                    source: e,
                })
            }
        };
        let attrs = sidecar::read_attrs(&path, key)?;
        Ok((path, meta, attrs))
    }
}

fn modified(meta: &fs::Metadata, key: &str) -> StorageResult<SystemTime> {
    meta.modified().map_err(|e| StorageError::Io {
        op: "stat object",
        key: key.to_string(),
        source: e,
    })
}

impl Bucket for FileBucket {
    fn attributes(&self, key: &str) -> StorageResult<ObjectAttributes> {
        let (_, meta, attrs) = self.for_key(key)?;
        Ok(ObjectAttributes {
            content_type: attrs.content_type,
            metadata: attrs.metadata,
            mod_time: modified(&meta, key)?,
            size: meta.len(),
        })
    }

    fn reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StorageResult<Box<dyn BlobReader>> {
        let (path, meta, attrs) = self.for_key(key)?;
        let attrs = ReaderAttributes {
            content_type: attrs.content_type,
            mod_time: modified(&meta, key)?,
            size: meta.len(),
        };
        let open = |e: io::Error| StorageError::Io {
            op: "open object",
            key: key.to_string(),
            source: e,
        };
        let file = fs::File::open(&path).map_err(open)?;
        let reader = FileReader::open(file, offset, length, attrs).map_err(open)?;
        Ok(Box::new(reader))
    }

    fn writer(
        &self,
        key: &str,
        content_type: &str,
        opts: WriteOptions,
    ) -> StorageResult<Box<dyn BlobWriter>> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                op: "create directories",
                key: key.to_string(),
                source: e,
            })?;
        }
        let file = fs::File::create(&path).map_err(|e| StorageError::Io {
            op: "create object",
            key: key.to_string(),
            source: e,
        })?;
        if let Some(hook) = opts.before_write {
            // The hook may ask for the native writable handle; this
            // backend never exposes one.
            hook(&HandleProbe::unsupported())?;
        }
        debug!(key, content_type, "staged object write");
        Ok(Box::new(FileWriter::new(
            file,
            path,
            key.to_string(),
            BlobAttrs::new(content_type, opts.metadata),
            opts.cancel,
        )))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => {
                return Err(StorageError::Io {
                    op: "delete object",
                    key: key.to_string(),
                    source: e,
                })
            }
        }
        // The sidecar goes with the payload. Absence is fine (the object
        // may have been written by another tool); anything else surfaces.
        if let Err(e) = fs::remove_file(sidecar::attrs_path(&path)) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(StorageError::Io {
                    op: "delete attributes",
                    key: key.to_string(),
                    source: e,
                });
            }
        }
        debug!(key, "deleted object");
        Ok(())
    }

    /// Flat, single-level enumeration of the root directory. Nested
    /// directories are surfaced as entries, not walked.
    fn list(&self, opts: &ListOptions) -> StorageResult<ListPage> {
        let io_err = |op: &'static str, e: io::Error| StorageError::Io {
            op,
            key: self.root.display().to_string(),
            source: e,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| io_err("list bucket", e))? {
            let entry = entry.map_err(|e| io_err("list bucket", e))?;
            let meta = entry.metadata().map_err(|e| io_err("stat entry", e))?;
            entries.push((entry.file_name().to_string_lossy().into_owned(), meta));
        }
        // Directory read order is filesystem-dependent; the listing
        // contract is lexicographic.
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let page_size = if opts.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            opts.page_size
        };
        let mut page = ListPage::default();
        for (name, meta) in entries {
            // Skip the self-generated attribute sidecars.
            if name.ends_with(ATTRS_EXT) {
                continue;
            }
            if !opts.prefix.is_empty() && !name.starts_with(&opts.prefix) {
                continue;
            }
            // Resume after the cursor from a previous page.
            if let Some(token) = &opts.page_token {
                if name.as_str() < token.as_str() {
                    continue;
                }
            }
            if page.objects.len() == page_size {
                page.next_page_token = Some(name);
                break;
            }
            let mod_time = modified(&meta, &name)?;
            page.objects.push(ObjectSummary {
                key: name,
                mod_time,
                size: meta.len(),
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

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::{Read, Write};

    use blobfs_core::{CancelToken, ErrorKind};
    use tempfile::TempDir;

    use super::*;

    fn bucket() -> (TempDir, FileBucket) {
        let dir = tempfile::tempdir().unwrap();
        let bucket = FileBucket::open(dir.path()).unwrap();
        (dir, bucket)
    }

    fn put(bucket: &FileBucket, key: &str, data: &[u8]) {
        bucket
            .write_all(key, "application/octet-stream", data, WriteOptions::default())
            .unwrap();
    }

    fn list_names(bucket: &FileBucket, opts: &ListOptions) -> Vec<String> {
        bucket
            .list(opts)
            .unwrap()
            .objects
            .into_iter()
            .map(|o| o.key)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn open_requires_existing_directory() {
        let err = FileBucket::open("/definitely/not/here").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn open_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        let err = FileBucket::open(&file).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRoot { .. }));
    }

    #[test]
    fn open_does_not_create_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("sub");
        assert!(FileBucket::open(&missing).is_err());
        assert!(!missing.exists());
    }

    // -----------------------------------------------------------------------
    // Write / read round trips
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_read_roundtrip() {
        let (_dir, bucket) = bucket();
        let mut metadata = BTreeMap::new();
        metadata.insert("owner".to_string(), "alice".to_string());
        bucket
            .write_all(
                "doc.txt",
                "text/plain",
                b"payload bytes",
                WriteOptions::with_metadata(metadata.clone()),
            )
            .unwrap();

        assert_eq!(bucket.read_all("doc.txt").unwrap(), b"payload bytes");
        let attrs = bucket.attributes("doc.txt").unwrap();
        assert_eq!(attrs.content_type, "text/plain");
        assert_eq!(attrs.metadata, metadata);
        assert_eq!(attrs.size, 13);
    }

    #[test]
    fn nested_key_creates_parent_directories() {
        let (dir, bucket) = bucket();
        put(&bucket, "a/b/c.bin", b"deep");
        assert!(dir.path().join("a/b/c.bin").exists());
        assert_eq!(bucket.read_all("a/b/c.bin").unwrap(), b"deep");
    }

    #[test]
    fn overwrite_is_last_writer_wins() {
        let (_dir, bucket) = bucket();
        bucket
            .write_all("k", "text/plain", b"first", WriteOptions::default())
            .unwrap();
        bucket
            .write_all("k", "text/html", b"second!", WriteOptions::default())
            .unwrap();

        assert_eq!(bucket.read_all("k").unwrap(), b"second!");
        assert_eq!(bucket.attributes("k").unwrap().content_type, "text/html");
    }

    #[test]
    fn externally_placed_file_reads_with_default_attrs() {
        let (dir, bucket) = bucket();
        fs::write(dir.path().join("outside"), b"not ours").unwrap();

        assert_eq!(bucket.read_all("outside").unwrap(), b"not ours");
        let attrs = bucket.attributes("outside").unwrap();
        assert_eq!(attrs.content_type, "");
        assert!(attrs.metadata.is_empty());
    }

    #[test]
    fn ranged_read() {
        let (_dir, bucket) = bucket();
        put(&bucket, "r", b"0123456789");

        let mut reader = bucket.reader("r", 4, Some(3)).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"456");
        reader.close().unwrap();
    }

    #[test]
    fn reader_surfaces_not_found() {
        let (_dir, bucket) = bucket();
        assert!(bucket.reader("ghost", 0, None).err().unwrap().is_not_found());
        assert!(bucket.attributes("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn before_write_hook_runs_and_sees_no_handle() {
        let (_dir, bucket) = bucket();
        let opts = WriteOptions {
            before_write: Some(Box::new(|probe| {
                assert!(probe.native_handle().is_none());
                Ok(())
            })),
            ..WriteOptions::default()
        };
        let writer = bucket.writer("hooked", "text/plain", opts).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn failing_before_write_hook_aborts() {
        let (_dir, bucket) = bucket();
        let opts = WriteOptions {
            before_write: Some(Box::new(|_probe| {
                Err(StorageError::NotImplemented("rejected by hook"))
            })),
            ..WriteOptions::default()
        };
        assert!(bucket.writer("hooked", "text/plain", opts).is_err());
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[test]
    fn cancelled_write_leaves_no_object_and_no_sidecar() {
        let (dir, bucket) = bucket();
        let token = CancelToken::new();
        let mut writer = bucket
            .writer("doomed", "text/plain", WriteOptions::with_cancel(token.clone()))
            .unwrap();
        writer.write_all(b"partial").unwrap();
        token.cancel();

        let err = writer.close().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!dir.path().join("doomed").exists());
        assert!(!dir.path().join("doomed.attrs").exists());
        assert!(bucket.read_all("doomed").unwrap_err().is_not_found());
    }

    #[test]
    fn past_deadline_behaves_like_cancellation() {
        let (dir, bucket) = bucket();
        let token = CancelToken::with_deadline(std::time::Instant::now());
        let mut writer = bucket
            .writer("late", "text/plain", WriteOptions::with_cancel(token))
            .unwrap();
        writer.write_all(b"too slow").unwrap();

        let err = writer.close().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!dir.path().join("late").exists());
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    #[test]
    fn delete_roundtrip() {
        let (dir, bucket) = bucket();
        put(&bucket, "victim", b"x");
        assert!(dir.path().join("victim.attrs").exists());

        bucket.delete("victim").unwrap();
        assert!(bucket.attributes("victim").unwrap_err().is_not_found());
        assert!(bucket.read_all("victim").unwrap_err().is_not_found());
        assert!(!dir.path().join("victim").exists());
        assert!(!dir.path().join("victim.attrs").exists());
        assert!(list_names(&bucket, &ListOptions::default()).is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, bucket) = bucket();
        assert!(bucket.delete("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_without_sidecar_succeeds() {
        let (dir, bucket) = bucket();
        fs::write(dir.path().join("bare"), b"no sidecar").unwrap();
        bucket.delete("bare").unwrap();
        assert!(!dir.path().join("bare").exists());
    }

    // -----------------------------------------------------------------------
    // Reserved sidecar suffix
    // -----------------------------------------------------------------------

    #[test]
    fn reserved_suffix_keys_are_invalid_everywhere() {
        let (dir, bucket) = bucket();
        // Even a file that happens to exist with the suffix is off limits.
        fs::write(dir.path().join("foo.attrs"), b"{}").unwrap();

        for result in [
            bucket.read_all("foo.attrs").map(|_| ()),
            bucket.attributes("foo.attrs").map(|_| ()),
            bucket
                .write_all("foo.attrs", "text/plain", b"x", WriteOptions::default()),
            bucket.delete("foo.attrs"),
        ] {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "got {err:?}");
        }
        assert!(dir.path().join("foo.attrs").exists());
    }

    #[test]
    fn invalid_keys_never_touch_the_filesystem() {
        let (dir, bucket) = bucket();
        for key in ["../escape", "a//b", "./x", "/abs", "."] {
            let err = bucket
                .write_all(key, "text/plain", b"x", WriteOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "key {key:?}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    // -----------------------------------------------------------------------
    // Listing and pagination
    // -----------------------------------------------------------------------

    #[test]
    fn listing_skips_sidecars_and_sorts() {
        let (_dir, bucket) = bucket();
        for key in ["zeta", "alpha", "mid"] {
            bucket
                .write_all(key, "text/plain", b"x", WriteOptions::default())
                .unwrap();
        }
        assert_eq!(
            list_names(&bucket, &ListOptions::default()),
            vec!["alpha", "mid", "zeta"]
        );
    }

    #[test]
    fn list_pages_cover_all_objects_without_duplicates() {
        let (_dir, bucket) = bucket();
        let keys = ["a", "b", "c", "d", "e", "f", "g"];
        for key in keys {
            put(&bucket, key, b"x");
        }

        let mut seen = Vec::new();
        let mut token = None;
        let mut pages = 0;
        loop {
            let page = bucket
                .list(&ListOptions {
                    page_size: 3,
                    page_token: token,
                    ..ListOptions::default()
                })
                .unwrap();
            pages += 1;
            assert!(page.objects.len() <= 3);
            seen.extend(page.objects.into_iter().map(|o| o.key));
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        assert_eq!(pages, 3); // ceil(7 / 3)
        assert_eq!(seen, keys);
    }

    #[test]
    fn exact_page_fill_ends_without_token() {
        let (_dir, bucket) = bucket();
        for key in ["a", "b"] {
            put(&bucket, key, b"x");
        }
        let page = bucket
            .list(&ListOptions {
                page_size: 2,
                ..ListOptions::default()
            })
            .unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn list_prefix_filter() {
        let (_dir, bucket) = bucket();
        for key in ["log.1", "log.2", "data.1"] {
            put(&bucket, key, b"x");
        }
        assert_eq!(
            list_names(
                &bucket,
                &ListOptions {
                    prefix: "log.".to_string(),
                    ..ListOptions::default()
                }
            ),
            vec!["log.1", "log.2"]
        );
    }

    #[test]
    fn listing_is_flat() {
        let (_dir, bucket) = bucket();
        put(&bucket, "a/b.txt", b"hello");
        // The nested object surfaces as its top-level directory entry;
        // directories are not walked.
        assert_eq!(list_names(&bucket, &ListOptions::default()), vec!["a"]);
    }

    // -----------------------------------------------------------------------
    // Unsupported surface
    // -----------------------------------------------------------------------

    #[test]
    fn signed_url_not_implemented() {
        let (_dir, bucket) = bucket();
        let err = bucket.signed_url("k", Duration::from_secs(60)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn no_native_handle() {
        let (_dir, bucket) = bucket();
        assert!(bucket.native_handle().is_none());
    }

    // -----------------------------------------------------------------------
    // Concrete scenario
    // -----------------------------------------------------------------------

    #[test]
    fn hello_roundtrip_scenario() {
        let (_dir, bucket) = bucket();
        bucket
            .write_all("b.txt", "text/plain", b"hello", WriteOptions::default())
            .unwrap();

        let page = bucket.list(&ListOptions::default()).unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "b.txt");
        assert_eq!(page.objects[0].size, 5);

        assert_eq!(bucket.read_all("b.txt").unwrap(), b"hello");
        assert_eq!(bucket.attributes("b.txt").unwrap().content_type, "text/plain");
    }
}
