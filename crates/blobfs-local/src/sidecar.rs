//! Sidecar persistence for per-object attributes.
//!
//! Attributes are stored next to the payload in a file named by
//! appending [`ATTRS_EXT`] to the object path, as a portable alternative
//! to filesystem extended attributes. The extension is reserved: no key
//! may resolve to a path ending in it, otherwise keys and sidecars would
//! be ambiguous. A missing sidecar reads as the default record, so files
//! placed under the root by other tools are still readable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use blobfs_core::{BlobAttrs, StorageError, StorageResult};

/// Reserved extension for attribute sidecar files.
pub const ATTRS_EXT: &str = ".attrs";

/// Full path of the sidecar for the object at `path`.
pub(crate) fn attrs_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(ATTRS_EXT);
    PathBuf::from(os)
}

/// Load the attribute record for the object at `path`.
///
/// Sidecar absence is not an error: the object was written by something
/// other than this adapter, and reads as the default record.
pub(crate) fn read_attrs(path: &Path, key: &str) -> StorageResult<BlobAttrs> {
    let bytes = match fs::read(attrs_path(path)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BlobAttrs::default()),
        Err(e) => {
            return Err(StorageError::Io {
                op: "read attributes",
                key: key.to_string(),
                source: e,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Persist the attribute record for the object at `path`, replacing any
/// previous record.
pub(crate) fn write_attrs(path: &Path, key: &str, attrs: &BlobAttrs) -> StorageResult<()> {
    let bytes = serde_json::to_vec(attrs).map_err(|e| StorageError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    fs::write(attrs_path(path), bytes).map_err(|e| StorageError::Io {
        op: "write attributes",
        key: key.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn attrs_path_appends_extension() {
        let p = attrs_path(Path::new("dir/object.bin"));
        assert_eq!(p, Path::new("dir/object.bin.attrs"));
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let object = dir.path().join("obj");
        fs::write(&object, b"payload").unwrap();

        let mut metadata = BTreeMap::new();
        metadata.insert("tier".to_string(), "gold".to_string());
        let attrs = BlobAttrs::new("text/plain", metadata);

        write_attrs(&object, "obj", &attrs).unwrap();
        let read_back = read_attrs(&object, "obj").unwrap();
        assert_eq!(read_back, attrs);
    }

    #[test]
    fn missing_sidecar_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let object = dir.path().join("external");
        fs::write(&object, b"dropped in by hand").unwrap();

        let attrs = read_attrs(&object, "external").unwrap();
        assert_eq!(attrs, BlobAttrs::default());
    }

    #[test]
    fn corrupt_sidecar_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let object = dir.path().join("obj");
        fs::write(&object, b"payload").unwrap();
        fs::write(attrs_path(&object), b"{not json").unwrap();

        match read_attrs(&object, "obj") {
            Err(StorageError::Codec { key, .. }) => assert_eq!(key, "obj"),
            other => panic!("expected Codec error, got {other:?}"),
        }
    }

    #[test]
    fn overwrite_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let object = dir.path().join("obj");
        fs::write(&object, b"payload").unwrap();

        write_attrs(&object, "obj", &BlobAttrs::new("text/plain", BTreeMap::new())).unwrap();
        write_attrs(&object, "obj", &BlobAttrs::new("image/png", BTreeMap::new())).unwrap();

        let attrs = read_attrs(&object, "obj").unwrap();
        assert_eq!(attrs.content_type, "image/png");
    }
}
