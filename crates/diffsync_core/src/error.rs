//! Error types for the sync engine.

use diffsync_store::StoreError;
use std::io;
use thiserror::Error;

use crate::key::SyncKey;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization.
///
/// The first three variants are the protocol-visible failure kinds; the
/// transport layer maps them to response codes. The rest are internal
/// faults surfaced as server errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Neither a shadow nor a live document exists for the key.
    #[error("not found: {key}")]
    NotFound {
        /// The key that was requested.
        key: String,
    },

    /// The target document was tombstoned.
    #[error("file deleted: {key}")]
    FileDeleted {
        /// The key that was requested.
        key: String,
    },

    /// The client's view of its shadow is stale or inconsistent.
    ///
    /// Nothing was mutated; the client resynchronizes by fetching its
    /// shadow content and retrying.
    #[error("sync conflict for {key}: {reason}")]
    Conflict {
        /// The key that conflicted.
        key: String,
        /// What the gate rejected.
        reason: String,
    },

    /// The patch block could not be parsed or applied by the delta
    /// library.
    #[error("delta error: {0}")]
    Delta(String),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The durable shadow file is unreadable.
    #[error("shadow store corrupted: {0}")]
    ShadowCorrupt(String),

    /// An I/O error occurred outside the document store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Creates a not-found error for a key.
    pub fn not_found(key: &SyncKey) -> Self {
        Self::NotFound {
            key: key.to_string(),
        }
    }

    /// Creates a file-deleted error for a key.
    pub fn file_deleted(key: &SyncKey) -> Self {
        Self::FileDeleted {
            key: key.to_string(),
        }
    }

    /// Creates a conflict error for a key.
    pub fn conflict(key: &SyncKey, reason: impl Into<String>) -> Self {
        Self::Conflict {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
