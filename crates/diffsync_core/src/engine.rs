//! The synchronization engine.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use diffsync_store::{DocumentStore, NamespaceStore, StoreError};

use crate::checksum::checksum;
use crate::delta::DeltaCodec;
use crate::error::{SyncError, SyncResult};
use crate::key::SyncKey;
use crate::shadow::ShadowStore;

/// Orchestrates registration, patch exchange, shadow recovery, and
/// deletion over a document store and a shadow store.
///
/// # Concurrency
///
/// Every public operation holds an exclusive lock for its [`SyncKey`] for
/// its full duration, so the patch algorithm's read-validate-mutate
/// sequence is atomic per key. Two *different* clients of the same
/// document are not mutually excluded: concurrent foreign edits are
/// reconciled by the best-effort merge and reported back through the
/// outgoing patch, not prevented by locking.
///
/// The engine is the only writer of document and shadow state.
pub struct SyncEngine<D, S> {
    docs: Arc<D>,
    shadows: Arc<S>,
    delta: DeltaCodec,
    locks: Mutex<HashMap<SyncKey, Arc<Mutex<()>>>>,
}

impl<D, S> SyncEngine<D, S>
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    /// Creates a new engine over the given stores.
    pub fn new(docs: Arc<D>, shadows: Arc<S>) -> Self {
        Self {
            docs,
            shadows,
            delta: DeltaCodec::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn key_lock(&self, key: &SyncKey) -> Arc<Mutex<()>> {
        let mut table = self.locks.lock();
        Arc::clone(
            table
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Reads the live document for a key, mapping store absence to the
    /// protocol's `NotFound`.
    fn read_live(&self, key: &SyncKey) -> SyncResult<String> {
        self.docs
            .read(key.namespace(), &key.path)
            .map_err(|err| match err {
                StoreError::NotFound { .. } => SyncError::not_found(key),
                other => other.into(),
            })
    }

    /// Prepares a client's shadow for a document and returns it.
    ///
    /// - Brand-new document: persists `initial` as the live content and
    ///   the shadow.
    /// - Existing document, new client: seeds the shadow from the
    ///   caller-supplied `initial` - what the client claims to have - to
    ///   be reconciled on the next patch round.
    /// - Existing shadow: returned unchanged; re-registration is
    ///   idempotent.
    ///
    /// # Errors
    ///
    /// Returns `FileDeleted` if the target document is tombstoned.
    pub fn register(&self, key: &SyncKey, initial: &str) -> SyncResult<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock();

        if self.docs.is_tombstoned(key.namespace(), &key.path)? {
            return Err(SyncError::file_deleted(key));
        }
        if let Some(existing) = self.shadows.get(key)? {
            debug!(%key, "re-registration returns existing shadow");
            return Ok(existing);
        }
        if self.docs.exists(key.namespace(), &key.path)? {
            info!(%key, "registering client for existing document");
        } else {
            info!(%key, "registering new document");
            self.docs.write(key.namespace(), &key.path, initial)?;
        }
        self.shadows.put(key, initial)?;
        Ok(initial.to_string())
    }

    /// Runs one convergence round for a client.
    ///
    /// The client sends a patch computed against its shadow plus the
    /// checksum of that shadow. The checksum gate proves the client's
    /// baseline matches the server's before the patch is trusted: on any
    /// shadow hunk failure or checksum mismatch the call aborts with
    /// `Conflict` and **no state is mutated**.
    ///
    /// Past the gate, the same patch is applied to the live document
    /// best-effort (hunk failures tolerated - the document may carry
    /// unrelated edits from other clients), the document is persisted if
    /// it changed, and the shadow converges to the live text. The return
    /// value is the serialized patch from the client's patched shadow to
    /// the live text: the foreign edits the client has not seen yet,
    /// empty when there are none.
    ///
    /// # Errors
    ///
    /// `FileDeleted` for tombstoned targets; `Conflict` when the gate
    /// rejects the round or the client was never registered for an
    /// existing document; `Delta` for malformed patch blocks.
    pub fn apply_patch(
        &self,
        key: &SyncKey,
        client_checksum: &str,
        patch_block: &str,
    ) -> SyncResult<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock();

        if self.docs.is_tombstoned(key.namespace(), &key.path)? {
            return Err(SyncError::file_deleted(key));
        }

        let shadow = match self.shadows.get(key)? {
            Some(shadow) => shadow,
            None => {
                if self.docs.exists(key.namespace(), &key.path)? {
                    // a document exists but this client never registered;
                    // the transport surfaces this so the client re-registers
                    return Err(SyncError::conflict(
                        key,
                        "document exists but client holds no shadow",
                    ));
                }
                info!(%key, "implicit registration of empty document");
                self.docs.write(key.namespace(), &key.path, "")?;
                self.shadows.put(key, "")?;
                String::new()
            }
        };

        let (patched_shadow, applied) = self.delta.apply(patch_block, &shadow)?;
        let actual = checksum(&shadow);
        if applied.iter().any(|&ok| !ok) || actual != client_checksum {
            warn!(
                %key,
                client = client_checksum,
                server = %actual,
                "patch rejected by checksum gate"
            );
            return Err(SyncError::conflict(
                key,
                format!(
                    "patch failed to apply on shadow: server checksum {actual}, client sent {client_checksum}"
                ),
            ));
        }

        let live = self.read_live(key)?;
        // hunk failures are tolerated here: the live document is shared and
        // may have drifted, so the merge is best-effort
        let (patched_live, _partial) = self.delta.apply(patch_block, &live)?;
        if patched_live != live {
            self.docs.write(key.namespace(), &key.path, &patched_live)?;
        }

        let outgoing = self.delta.diff(&patched_shadow, &patched_live)?;
        self.shadows.put(key, &patched_live)?;
        debug!(%key, foreign_edits = !outgoing.is_empty(), "patch round complete");
        Ok(outgoing)
    }

    /// Returns the shadow content for a key, the client's recovery path
    /// after a failed patch.
    ///
    /// A missing shadow is lazily seeded from the live document. A failed
    /// `apply_patch` never mutates the shadow, so this always reflects
    /// the client's last good baseline.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when neither a shadow nor a live document
    /// exists.
    pub fn shadow_content(&self, key: &SyncKey) -> SyncResult<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock();

        if let Some(content) = self.shadows.get(key)? {
            return Ok(content);
        }
        if !self.docs.exists(key.namespace(), &key.path)? {
            return Err(SyncError::not_found(key));
        }
        debug!(%key, "seeding shadow from live document");
        let live = self.read_live(key)?;
        self.shadows.put(key, &live)?;
        Ok(live)
    }

    /// Tombstones a document and drops the caller's shadow.
    ///
    /// Returns the content that was live immediately before tombstoning
    /// so the caller can confirm what was removed. Shadow removal is
    /// best-effort; other clients' shadows are left to conflict naturally
    /// on their next round.
    ///
    /// # Errors
    ///
    /// `FileDeleted` if already tombstoned; `NotFound` if the document
    /// never existed.
    pub fn delete(&self, key: &SyncKey) -> SyncResult<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock();

        if self.docs.is_tombstoned(key.namespace(), &key.path)? {
            return Err(SyncError::file_deleted(key));
        }
        let last = self.read_live(key)?;
        self.docs
            .tombstone(key.namespace(), &key.path)
            .map_err(|err| match err {
                StoreError::NotFound { .. } => SyncError::not_found(key),
                other => other.into(),
            })?;
        if let Err(err) = self.shadows.remove(key) {
            warn!(%key, %err, "failed to drop shadow entry after delete");
        }
        info!(%key, "document deleted");
        Ok(last)
    }

    /// Returns true if the namespace exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid.
    pub fn namespace_exists(&self, namespace: &str) -> SyncResult<bool> {
        Ok(self.docs.namespace_exists(namespace)?)
    }

    /// Idempotently creates a namespace and lists its live documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace name is invalid or enumeration
    /// fails.
    pub fn ensure_and_list_namespace(&self, namespace: &str) -> SyncResult<Vec<String>> {
        self.docs.ensure_namespace(namespace)?;
        Ok(self.docs.list_documents(namespace)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::MemoryShadowStore;
    use diffsync_store::MemoryStore;

    type TestEngine = SyncEngine<MemoryStore, MemoryShadowStore>;

    fn engine() -> TestEngine {
        SyncEngine::new(Arc::new(MemoryStore::new()), Arc::new(MemoryShadowStore::new()))
    }

    fn key(client: &str) -> SyncKey {
        SyncKey::new(None, "a.txt", client)
    }

    fn patch(before: &str, after: &str) -> String {
        DeltaCodec::new().diff(before, after).unwrap()
    }

    #[test]
    fn register_new_document() {
        let engine = engine();
        let shadow = engine.register(&key("u1"), "hello").unwrap();
        assert_eq!(shadow, "hello");
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "hello");
    }

    #[test]
    fn register_is_idempotent() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();
        engine.docs.write(None, "a.txt", "drifted").unwrap();

        // second registration neither re-seeds the shadow nor touches
        // the document
        let shadow = engine.register(&key("u1"), "something else").unwrap();
        assert_eq!(shadow, "hello");
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "drifted");
    }

    #[test]
    fn register_existing_document_seeds_from_caller() {
        let engine = engine();
        engine.register(&key("u1"), "server copy").unwrap();

        // u2 joins claiming different content; its shadow starts as the
        // claim and reconciles on the next patch round
        let shadow = engine.register(&key("u2"), "client claim").unwrap();
        assert_eq!(shadow, "client claim");
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "server copy");
    }

    #[test]
    fn register_tombstoned_fails() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();
        engine.delete(&key("u1")).unwrap();

        let result = engine.register(&key("u2"), "hello");
        assert!(matches!(result, Err(SyncError::FileDeleted { .. })));
    }

    #[test]
    fn patch_converges_hello_world() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        let outgoing = engine
            .apply_patch(&key("u1"), &checksum("hello"), &patch("hello", "hello world"))
            .unwrap();

        assert!(outgoing.is_empty());
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "hello world");
        assert_eq!(
            engine.shadows.get(&key("u1")).unwrap().as_deref(),
            Some("hello world")
        );

        // replaying with the stale checksum now conflicts
        let result = engine.apply_patch(
            &key("u1"),
            &checksum("hello"),
            &patch("hello", "hello again"),
        );
        assert!(matches!(result, Err(SyncError::Conflict { .. })));
    }

    #[test]
    fn checksum_gate_mutates_nothing() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        let result = engine.apply_patch(
            &key("u1"),
            &checksum("wrong baseline"),
            &patch("hello", "hello world"),
        );
        assert!(matches!(result, Err(SyncError::Conflict { .. })));
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "hello");
        assert_eq!(
            engine.shadows.get(&key("u1")).unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn patch_without_registration_on_existing_doc_conflicts() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        let result = engine.apply_patch(&key("u2"), &checksum("hello"), "");
        assert!(matches!(result, Err(SyncError::Conflict { .. })));
    }

    #[test]
    fn patch_unknown_document_implicitly_registers_empty() {
        let engine = engine();

        let outgoing = engine
            .apply_patch(&key("u1"), &checksum(""), &patch("", "fresh content"))
            .unwrap();

        assert!(outgoing.is_empty());
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "fresh content");
    }

    #[test]
    fn concurrent_writers_merge() {
        let engine = engine();
        let base = "alpha\nbravo\ncharlie\ndelta\n";
        engine.register(&key("u1"), base).unwrap();
        engine.register(&key("u2"), base).unwrap();

        // u1 edits the top of the document
        let m1 = "ALPHA\nbravo\ncharlie\ndelta\n";
        let out1 = engine
            .apply_patch(&key("u1"), &checksum(base), &patch(base, m1))
            .unwrap();
        assert!(out1.is_empty());

        // u2 edits the bottom, unaware of u1's edit
        let m2 = "alpha\nbravo\ncharlie\nDELTA\n";
        let out2 = engine
            .apply_patch(&key("u2"), &checksum(base), &patch(base, m2))
            .unwrap();

        // the document holds both edits and u2 is told about u1's
        let merged = engine.docs.read(None, "a.txt").unwrap();
        assert!(merged.contains("ALPHA"));
        assert!(merged.contains("DELTA"));
        assert!(!out2.is_empty());
        assert_eq!(
            engine.shadows.get(&key("u2")).unwrap().as_deref(),
            Some(merged.as_str())
        );
    }

    #[test]
    fn shadow_content_returns_existing() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();
        assert_eq!(engine.shadow_content(&key("u1")).unwrap(), "hello");
    }

    #[test]
    fn shadow_content_seeds_from_live() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        // u2 never registered; recovery seeds its shadow from the document
        assert_eq!(engine.shadow_content(&key("u2")).unwrap(), "hello");
        assert!(engine.shadows.contains(&key("u2")).unwrap());
    }

    #[test]
    fn shadow_content_unknown_fails() {
        let engine = engine();
        let result = engine.shadow_content(&key("u1"));
        assert!(matches!(result, Err(SyncError::NotFound { .. })));
    }

    #[test]
    fn failed_patch_leaves_shadow_for_recovery() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        let _ = engine.apply_patch(&key("u1"), "bogus", &patch("hello", "x"));
        assert_eq!(engine.shadow_content(&key("u1")).unwrap(), "hello");
    }

    #[test]
    fn delete_returns_last_live_content() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();

        let last = engine.delete(&key("u1")).unwrap();
        assert_eq!(last, "hello");
        assert!(!engine.shadows.contains(&key("u1")).unwrap());
    }

    #[test]
    fn delete_twice_fails_file_deleted() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();
        engine.delete(&key("u1")).unwrap();

        assert!(matches!(
            engine.delete(&key("u1")),
            Err(SyncError::FileDeleted { .. })
        ));
        assert!(matches!(
            engine.delete(&key("u1")),
            Err(SyncError::FileDeleted { .. })
        ));
    }

    #[test]
    fn no_resurrection_after_delete() {
        let engine = engine();
        engine.register(&key("u1"), "hello").unwrap();
        engine.delete(&key("u1")).unwrap();

        assert!(matches!(
            engine.register(&key("u1"), "hello"),
            Err(SyncError::FileDeleted { .. })
        ));
        assert!(matches!(
            engine.apply_patch(&key("u1"), &checksum("hello"), ""),
            Err(SyncError::FileDeleted { .. })
        ));
    }

    #[test]
    fn delete_unknown_fails_not_found() {
        let engine = engine();
        assert!(matches!(
            engine.delete(&key("u1")),
            Err(SyncError::NotFound { .. })
        ));
    }

    #[test]
    fn namespace_passthroughs() {
        let engine = engine();
        assert!(!engine.namespace_exists("r1").unwrap());

        let docs = engine.ensure_and_list_namespace("r1").unwrap();
        assert!(docs.is_empty());
        assert!(engine.namespace_exists("r1").unwrap());

        engine
            .register(&SyncKey::new(Some("r1"), "a.txt", "u1"), "a")
            .unwrap();
        engine
            .register(&SyncKey::new(Some("r1"), "sub/b.txt", "u1"), "b")
            .unwrap();
        assert_eq!(
            engine.ensure_and_list_namespace("r1").unwrap(),
            vec!["a.txt".to_string(), "sub/b.txt".to_string()]
        );
    }

    #[test]
    fn racing_patches_one_wins() {
        let engine = Arc::new(engine());
        engine.register(&key("u1"), "base").unwrap();

        let block = patch("base", "edited");
        let sum = checksum("base");

        let mut handles = Vec::new();
        for _ in 0..2 {
            let engine = Arc::clone(&engine);
            let block = block.clone();
            let sum = sum.clone();
            handles.push(std::thread::spawn(move || {
                engine.apply_patch(&key("u1"), &sum, &block)
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // the key lock serializes the rounds: the first succeeds, the
        // second sees an updated shadow and fails the gate
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(SyncError::Conflict { .. })))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 1);

        // state is consistent afterward
        assert_eq!(engine.docs.read(None, "a.txt").unwrap(), "edited");
        assert_eq!(
            engine.shadows.get(&key("u1")).unwrap().as_deref(),
            Some("edited")
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_converges(
                base in "[ -~]{0,64}",
                edited in "[ -~]{0,64}",
            ) {
                let engine = engine();
                engine.register(&key("u1"), &base).unwrap();

                engine
                    .apply_patch(&key("u1"), &checksum(&base), &patch(&base, &edited))
                    .unwrap();

                prop_assert_eq!(engine.docs.read(None, "a.txt").unwrap(), edited.clone());
                prop_assert_eq!(
                    engine.shadows.get(&key("u1")).unwrap(),
                    Some(edited)
                );
            }

            #[test]
            fn wrong_checksum_never_mutates(
                base in "[ -~]{1,64}",
                edited in "[ -~]{0,64}",
                bogus in "[a-f0-9]{32}",
            ) {
                prop_assume!(bogus != checksum(&base));
                let engine = engine();
                engine.register(&key("u1"), &base).unwrap();

                let result = engine.apply_patch(&key("u1"), &bogus, &patch(&base, &edited));
                prop_assert!(
                    matches!(result, Err(SyncError::Conflict { .. })),
                    "expected a Conflict error"
                );
                prop_assert_eq!(engine.docs.read(None, "a.txt").unwrap(), base.clone());
                prop_assert_eq!(engine.shadows.get(&key("u1")).unwrap(), Some(base));
            }
        }
    }
}
