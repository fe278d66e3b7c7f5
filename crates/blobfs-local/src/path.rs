//! Key validation and translation to filesystem paths.
//!
//! A key is accepted only when it is byte-for-byte identical to its
//! cleaned slash form. Rejecting divergence, rather than silently
//! accepting the cleaned form, is what keeps the key-to-path mapping
//! 1:1: two different keys can never name the same file, and no valid
//! key can name a file outside the bucket root.

use std::path::PathBuf;

use blobfs_core::{StorageError, StorageResult};

/// Non-alphanumeric characters permitted in a key.
const ALLOWED_PUNCT: &[char] = &['/', '.', ' ', '_', '-'];

/// Collapse a slash-separated path lexically: drop empty and `.`
/// segments, resolve `..` against preceding segments, strip trailing
/// slashes. Matches POSIX lexical path cleaning; the empty path cleans
/// to `.`.
pub(crate) fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(&last) if last != "..") {
                    out.pop();
                } else if !rooted {
                    // Leading `..` segments survive in a relative path
                    // but can never climb above a rooted one.
                    out.push("..");
                }
            }
            _ => out.push(seg),
        }
    }
    let joined = out.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Translate a key into a relative filesystem path.
///
/// Guarantees that exactly one valid key exists for any resulting path
/// and that the path stays inside the bucket root. Validation runs in a
/// fixed order; every failure is [`StorageError::InvalidKey`].
pub fn resolve_path(key: &str) -> StorageResult<PathBuf> {
    for c in key.chars() {
        if !(c.is_ascii_alphanumeric() || ALLOWED_PUNCT.contains(&c)) {
            return Err(invalid(key, format!("contains invalid character {c:?}")));
        }
    }
    if clean(key) != key {
        return Err(invalid(key, "not a clean slash-separated path".to_string()));
    }
    if key.starts_with('/') {
        return Err(invalid(key, "starts with a slash".to_string()));
    }
    if key == "." {
        return Err(invalid(key, "the bare path \".\"".to_string()));
    }
    // A clean relative key escapes the root only as a literal `..` or
    // `../...`; everything else was already collapsed or rejected.
    if key == ".." || key.starts_with("../") {
        return Err(invalid(key, "escapes the bucket root".to_string()));
    }
    Ok(key.split('/').collect())
}

fn invalid(key: &str, reason: String) -> StorageError {
    StorageError::InvalidKey {
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    // -----------------------------------------------------------------------
    // clean()
    // -----------------------------------------------------------------------

    #[test]
    fn clean_collapses_redundancy() {
        assert_eq!(clean("a//b"), "a/b");
        assert_eq!(clean("./a"), "a");
        assert_eq!(clean("a/./b"), "a/b");
        assert_eq!(clean("a/../b"), "b");
        assert_eq!(clean("a/"), "a");
        assert_eq!(clean(""), ".");
        assert_eq!(clean("."), ".");
    }

    #[test]
    fn clean_preserves_leading_parent_segments() {
        assert_eq!(clean(".."), "..");
        assert_eq!(clean("../a"), "../a");
        assert_eq!(clean("../../a"), "../../a");
        assert_eq!(clean("a/../../b"), "../b");
    }

    #[test]
    fn clean_rooted_paths() {
        assert_eq!(clean("/a"), "/a");
        assert_eq!(clean("/.."), "/");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("/a/"), "/a");
    }

    #[test]
    fn clean_fixed_point() {
        for p in ["a", "a/b", "a/b/c.txt", "..", "../x", "/a/b", "."] {
            let once = clean(p);
            assert_eq!(clean(&once), once, "clean not idempotent for {p:?}");
        }
    }

    // -----------------------------------------------------------------------
    // resolve_path: accepted keys
    // -----------------------------------------------------------------------

    #[test]
    fn valid_keys_resolve() {
        for key in [
            "a",
            "a/b.txt",
            "deep/nested/dir/file",
            "with space",
            "mixed_Case-1.2.tar.gz",
            "trailing.dot.",
        ] {
            let rel = resolve_path(key).unwrap();
            assert!(rel.is_relative(), "{key:?} resolved to an absolute path");
        }
    }

    #[test]
    fn resolved_path_mirrors_key_segments() {
        let rel = resolve_path("a/b/c.txt").unwrap();
        let segments: Vec<_> = rel.iter().map(|s| s.to_string_lossy().into_owned()).collect();
        assert_eq!(segments, vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn distinct_keys_resolve_to_distinct_paths() {
        let keys = [
            "a", "b", "a/b", "a/c", "ab", "a.b", "a b", "a_b", "a-b", "a/b/c",
        ];
        let resolved: HashSet<PathBuf> =
            keys.iter().map(|k| resolve_path(k).unwrap()).collect();
        assert_eq!(resolved.len(), keys.len());
    }

    // -----------------------------------------------------------------------
    // resolve_path: rejected keys
    // -----------------------------------------------------------------------

    fn assert_invalid(key: &str) {
        match resolve_path(key) {
            Err(StorageError::InvalidKey { .. }) => {}
            other => panic!("expected InvalidKey for {key:?}, got {other:?}"),
        }
    }

    #[test]
    fn reject_disallowed_characters() {
        for key in ["a*b", "a?b", "a\\b", "a:b", "héllo", "tab\tkey", "a\0b", "a+b"] {
            assert_invalid(key);
        }
    }

    #[test]
    fn reject_unclean_forms() {
        for key in ["a//b", "./a", "a/./b", "a/../b", "a/", "", "a/.."] {
            assert_invalid(key);
        }
    }

    #[test]
    fn reject_absolute() {
        assert_invalid("/a");
        assert_invalid("/");
    }

    #[test]
    fn reject_bare_dot() {
        assert_invalid(".");
    }

    #[test]
    fn reject_root_escapes() {
        assert_invalid("..");
        assert_invalid("../a");
        assert_invalid("../../etc/passwd");
    }
}
