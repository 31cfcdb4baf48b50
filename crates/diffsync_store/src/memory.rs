//! In-memory document store for testing.

use crate::error::{StoreError, StoreResult};
use crate::path::{display_key, validate_namespace, validate_rel_path};
use crate::store::{DocState, DocumentStore, NamespaceStore};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct DocRecord {
    content: String,
    tombstoned: bool,
}

/// An in-memory document store.
///
/// Documents live in a process-wide map with an explicit tombstone flag.
/// Suitable for unit tests, integration tests, and ephemeral document
/// spaces that do not need persistence.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across request handlers.
///
/// # Example
///
/// ```rust
/// use diffsync_store::{DocumentStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.write(None, "a.txt", "hello").unwrap();
/// assert_eq!(store.read(None, "a.txt").unwrap(), "hello");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<(Option<String>, String), DocRecord>>,
    namespaces: RwLock<HashSet<String>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records, tombstoned ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn validate(namespace: Option<&str>, path: &str) -> StoreResult<()> {
        if let Some(ns) = namespace {
            validate_namespace(ns)?;
        }
        validate_rel_path(path)
    }

    fn id(namespace: Option<&str>, path: &str) -> (Option<String>, String) {
        (namespace.map(str::to_string), path.to_string())
    }
}

impl DocumentStore for MemoryStore {
    fn state(&self, namespace: Option<&str>, path: &str) -> StoreResult<DocState> {
        Self::validate(namespace, path)?;
        Ok(match self.docs.read().get(&Self::id(namespace, path)) {
            None => DocState::Absent,
            Some(record) if record.tombstoned => DocState::Tombstoned,
            Some(_) => DocState::Live,
        })
    }

    fn read(&self, namespace: Option<&str>, path: &str) -> StoreResult<String> {
        Self::validate(namespace, path)?;
        match self.docs.read().get(&Self::id(namespace, path)) {
            Some(record) if !record.tombstoned => Ok(record.content.clone()),
            _ => Err(StoreError::not_found(display_key(namespace, path))),
        }
    }

    fn write(&self, namespace: Option<&str>, path: &str, content: &str) -> StoreResult<()> {
        Self::validate(namespace, path)?;
        if let Some(ns) = namespace {
            // writing implicitly creates parent structure
            self.namespaces.write().insert(ns.to_string());
        }
        let mut docs = self.docs.write();
        let record = docs
            .entry(Self::id(namespace, path))
            .or_insert_with(|| DocRecord {
                content: String::new(),
                tombstoned: false,
            });
        record.content = content.to_string();
        Ok(())
    }

    fn tombstone(&self, namespace: Option<&str>, path: &str) -> StoreResult<()> {
        Self::validate(namespace, path)?;
        let mut docs = self.docs.write();
        match docs.get_mut(&Self::id(namespace, path)) {
            Some(record) => {
                record.tombstoned = true;
                Ok(())
            }
            None => Err(StoreError::not_found(display_key(namespace, path))),
        }
    }
}

impl NamespaceStore for MemoryStore {
    fn ensure_namespace(&self, namespace: &str) -> StoreResult<()> {
        validate_namespace(namespace)?;
        self.namespaces.write().insert(namespace.to_string());
        Ok(())
    }

    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool> {
        validate_namespace(namespace)?;
        Ok(self.namespaces.read().contains(namespace))
    }

    fn list_documents(&self, namespace: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .list_entries(namespace)?
            .into_iter()
            .filter(|(_, state)| state.is_live())
            .map(|(path, _)| path)
            .collect())
    }

    fn list_entries(&self, namespace: &str) -> StoreResult<Vec<(String, DocState)>> {
        validate_namespace(namespace)?;
        let docs = self.docs.read();
        let mut out: Vec<(String, DocState)> = docs
            .iter()
            .filter(|((ns, _), _)| ns.as_deref() == Some(namespace))
            .map(|((_, path), record)| {
                let state = if record.tombstoned {
                    DocState::Tombstoned
                } else {
                    DocState::Live
                };
                (path.clone(), state)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn list_namespaces(&self) -> StoreResult<Vec<String>> {
        let mut out: Vec<String> = self.namespaces.read().iter().cloned().collect();
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.state(None, "a.txt").unwrap(), DocState::Absent);
    }

    #[test]
    fn write_read_round_trip() {
        let store = MemoryStore::new();
        store.write(Some("r1"), "a.txt", "hello").unwrap();
        assert_eq!(store.read(Some("r1"), "a.txt").unwrap(), "hello");
        assert!(store.namespace_exists("r1").unwrap());
    }

    #[test]
    fn tombstone_keeps_record() {
        let store = MemoryStore::new();
        store.write(None, "a.txt", "hello").unwrap();
        store.tombstone(None, "a.txt").unwrap();
        store.tombstone(None, "a.txt").unwrap();

        assert_eq!(store.state(None, "a.txt").unwrap(), DocState::Tombstoned);
        assert!(matches!(
            store.read(None, "a.txt"),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tombstone_absent_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.tombstone(None, "ghost.txt"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn listing_matches_file_store_semantics() {
        let store = MemoryStore::new();
        store.write(Some("r1"), "b.txt", "b").unwrap();
        store.write(Some("r1"), "a.txt", "a").unwrap();
        store.write(Some("r1"), "sub/c.txt", "c").unwrap();
        store.write(Some("r2"), "other.txt", "o").unwrap();
        store.tombstone(Some("r1"), "b.txt").unwrap();

        assert_eq!(
            store.list_documents("r1").unwrap(),
            vec!["a.txt".to_string(), "sub/c.txt".to_string()]
        );
        assert_eq!(
            store.list_entries("r1").unwrap(),
            vec![
                ("a.txt".to_string(), DocState::Live),
                ("b.txt".to_string(), DocState::Tombstoned),
                ("sub/c.txt".to_string(), DocState::Live),
            ]
        );
    }

    #[test]
    fn separate_namespaces_do_not_mix() {
        let store = MemoryStore::new();
        store.write(Some("r1"), "a.txt", "one").unwrap();
        store.write(None, "a.txt", "flat").unwrap();

        assert_eq!(store.read(Some("r1"), "a.txt").unwrap(), "one");
        assert_eq!(store.read(None, "a.txt").unwrap(), "flat");
        assert_eq!(store.list_documents("r1").unwrap().len(), 1);
    }
}
