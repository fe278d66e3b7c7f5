//! Local-filesystem bucket backend.
//!
//! [`FileBucket`] maps opaque string keys onto files under a root
//! directory, providing the read, write, delete, list, and metadata
//! operations of the [`Bucket`](blobfs_core::Bucket) abstraction. It is
//! a stand-in for a networked object-storage backend during local
//! development and testing; durability is whatever the underlying
//! filesystem provides.
//!
//! # Keys
//!
//! Keys may contain alphanumerics, slashes, periods, spaces,
//! underscores, and dashes. Repeated slashes, `.` and `..` segments,
//! and leading slashes are rejected rather than normalized, so every
//! valid key maps to exactly one file under the root and no key can
//! escape it.
//!
//! # Metadata
//!
//! Content type and user metadata live in a JSON sidecar next to the
//! payload, named by appending the reserved `.attrs` extension. Keys
//! ending in that extension are rejected by every operation. A payload
//! without a sidecar (placed under the root by other tools) reads with
//! empty attributes.
//!
//! # Listing
//!
//! Listing is a flat enumeration of the root directory in name order
//! with cursor-based pagination; nested directories are surfaced as
//! entries, not walked. This is a documented limitation.
//!
//! No native handles are exposed through the capability probes, and
//! signed URLs are not supported.

pub mod bucket;
pub mod path;
pub mod reader;
pub mod sidecar;
pub mod writer;

pub use bucket::FileBucket;
pub use path::resolve_path;
pub use reader::FileReader;
pub use sidecar::ATTRS_EXT;
pub use writer::FileWriter;
