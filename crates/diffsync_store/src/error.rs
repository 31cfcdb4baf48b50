//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document does not exist (or only a tombstone remains).
    #[error("document not found: {path}")]
    NotFound {
        /// The logical `(namespace, path)` that was requested.
        path: String,
    },

    /// The document path or namespace is not addressable.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path or namespace.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The data directory is owned by another process.
    #[error("data directory locked: another process has exclusive access")]
    Locked,
}

impl StoreError {
    /// Creates a not-found error for a logical document address.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an invalid-path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::not_found("r1/a.txt");
        assert_eq!(err.to_string(), "document not found: r1/a.txt");

        let err = StoreError::invalid_path("../etc", "parent traversal");
        assert!(err.to_string().contains("parent traversal"));
    }
}
