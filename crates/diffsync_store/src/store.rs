//! Document store trait definitions.

use crate::error::StoreResult;

/// The lifecycle state of a document at one `(namespace, path)` address.
///
/// Stores resolve every address to exactly one of these states. In
/// particular, a tombstone always wins: if a deletion marker exists for the
/// address, the document is `Tombstoned` even when stale live content is
/// also present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    /// No record exists and none ever tombstoned.
    Absent,
    /// A live document exists.
    Live,
    /// The document was soft-deleted; content remains recoverable.
    Tombstoned,
}

impl DocState {
    /// Returns true if the document is live.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, DocState::Live)
    }

    /// Returns true if the document was soft-deleted.
    #[must_use]
    pub fn is_tombstoned(self) -> bool {
        matches!(self, DocState::Tombstoned)
    }
}

/// The authoritative store of synchronized documents.
///
/// There is exactly one document record per `(namespace, path)`; every
/// client shadow of that document reconciles against it. Implementations
/// must be safe to share across request handler threads.
///
/// # Invariants
///
/// - `write` is atomic from the caller's perspective: readers observe
///   either the old content or the new content, never a partial write
/// - `tombstone` is idempotent once the document is tombstoned
/// - `read` and `exists` treat tombstoned documents as gone
pub trait DocumentStore: Send + Sync {
    /// Resolves the lifecycle state of a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the state cannot be
    /// determined.
    fn state(&self, namespace: Option<&str>, path: &str) -> StoreResult<DocState>;

    /// Returns true if a live document exists at the address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    fn exists(&self, namespace: Option<&str>, path: &str) -> StoreResult<bool> {
        Ok(self.state(namespace, path)?.is_live())
    }

    /// Returns true if the document was tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    fn is_tombstoned(&self, namespace: Option<&str>, path: &str) -> StoreResult<bool> {
        Ok(self.state(namespace, path)?.is_tombstoned())
    }

    /// Reads the live content of a document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document is absent or tombstoned.
    fn read(&self, namespace: Option<&str>, path: &str) -> StoreResult<String>;

    /// Writes document content, creating parent structure as needed.
    ///
    /// The write is atomic: concurrent readers never observe partial
    /// content.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the write fails.
    fn write(&self, namespace: Option<&str>, path: &str, content: &str) -> StoreResult<()>;

    /// Soft-deletes a document.
    ///
    /// Succeeds as a no-op when the document is already tombstoned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the address never held a document.
    fn tombstone(&self, namespace: Option<&str>, path: &str) -> StoreResult<()>;
}

/// Namespace (tenant root) management.
///
/// A namespace groups documents under a directory-like scope. Creation is
/// idempotent and enumerating a namespace yields forward-slash relative
/// paths regardless of host path conventions.
pub trait NamespaceStore: Send + Sync {
    /// Idempotently creates the namespace's storage scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid or creation fails.
    fn ensure_namespace(&self, namespace: &str) -> StoreResult<()>;

    /// Returns true if the namespace exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid.
    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool>;

    /// Lists the live documents under a namespace.
    ///
    /// Paths are relative to the namespace root, sorted, with `/`
    /// separators. Tombstoned documents are excluded; a namespace that
    /// does not exist lists as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid or enumeration
    /// fails.
    fn list_documents(&self, namespace: &str) -> StoreResult<Vec<String>>;

    /// Lists every entry under a namespace with its state.
    ///
    /// Unlike [`NamespaceStore::list_documents`] this includes tombstoned
    /// entries. Intended for operator tooling, not the sync protocol.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid or enumeration
    /// fails.
    fn list_entries(&self, namespace: &str) -> StoreResult<Vec<(String, DocState)>>;

    /// Lists all namespaces in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration fails.
    fn list_namespaces(&self) -> StoreResult<Vec<String>>;
}
