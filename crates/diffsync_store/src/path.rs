//! Validation of logical document addresses.
//!
//! Document paths arrive from the wire. Before a path touches the
//! filesystem it must be proven to stay inside its namespace and to avoid
//! the store's reserved names.

use crate::error::{StoreError, StoreResult};
use crate::file::{LOCK_FILE, SHADOW_FILE, TOMBSTONE_PREFIX};

/// Validates a document path relative to its namespace root.
///
/// Rules: non-empty, `/`-separated, no empty / `.` / `..` segments, no
/// backslashes, no segment that collides with a reserved file name, and no
/// segment carrying the tombstone prefix (it would alias a deletion
/// marker).
pub(crate) fn validate_rel_path(path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Err(StoreError::invalid_path(path, "empty path"));
    }
    if path.contains('\\') {
        return Err(StoreError::invalid_path(path, "backslash separator"));
    }
    for segment in path.split('/') {
        validate_segment(path, segment)?;
    }
    Ok(())
}

/// Validates a namespace name: a single path segment under the data root.
pub(crate) fn validate_namespace(namespace: &str) -> StoreResult<()> {
    if namespace.contains('/') || namespace.contains('\\') {
        return Err(StoreError::invalid_path(namespace, "namespace must be a single segment"));
    }
    validate_segment(namespace, namespace)
}

fn validate_segment(whole: &str, segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(StoreError::invalid_path(whole, "empty segment"));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::invalid_path(whole, "relative segment"));
    }
    if segment.starts_with(TOMBSTONE_PREFIX) {
        return Err(StoreError::invalid_path(whole, "reserved tombstone prefix"));
    }
    if segment == LOCK_FILE || segment == SHADOW_FILE {
        return Err(StoreError::invalid_path(whole, "reserved file name"));
    }
    Ok(())
}

/// Formats a logical address for error messages.
pub(crate) fn display_key(namespace: Option<&str>, path: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{path}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_paths() {
        validate_rel_path("a.txt").unwrap();
        validate_rel_path("sub/dir/b.md").unwrap();
    }

    #[test]
    fn rejects_traversal() {
        assert!(validate_rel_path("../escape").is_err());
        assert!(validate_rel_path("a/../b").is_err());
        assert!(validate_rel_path("./a").is_err());
    }

    #[test]
    fn rejects_reserved_names() {
        assert!(validate_rel_path("LOCK").is_err());
        assert!(validate_rel_path("shadows.json").is_err());
        assert!(validate_rel_path("sub/DELETED_a.txt").is_err());
    }

    #[test]
    fn rejects_empty_and_backslash() {
        assert!(validate_rel_path("").is_err());
        assert!(validate_rel_path("a//b").is_err());
        assert!(validate_rel_path("a\\b").is_err());
    }

    #[test]
    fn namespace_is_single_segment() {
        validate_namespace("r1").unwrap();
        assert!(validate_namespace("r1/sub").is_err());
        assert!(validate_namespace("..").is_err());
    }
}
