//! Engine fixtures and a simulated sync client.

use std::sync::Arc;
use tempfile::TempDir;

use diffsync_core::{
    checksum, DeltaCodec, FileShadowStore, MemoryShadowStore, ShadowStore, SyncEngine, SyncKey,
    SyncResult,
};
use diffsync_store::{DocumentStore, FileStore, MemoryStore, NamespaceStore};

/// An engine over in-memory stores.
pub type MemoryEngine = SyncEngine<MemoryStore, MemoryShadowStore>;

/// An engine over a temp data directory with durable shadows.
pub type FileEngine = SyncEngine<FileStore, FileShadowStore>;

/// Creates an engine over fresh in-memory stores.
#[must_use]
pub fn memory_engine() -> Arc<MemoryEngine> {
    Arc::new(SyncEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryShadowStore::new()),
    ))
}

/// An engine over a temporary data directory with automatic cleanup.
pub struct TempEngine {
    /// The engine.
    pub engine: Arc<FileEngine>,
    /// The temp directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempEngine {
    /// Creates a file-backed engine in a fresh temp directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory or stores cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let docs = FileStore::open(temp_dir.path()).expect("failed to open file store");
        let shadows =
            FileShadowStore::open(&docs.shadow_path()).expect("failed to open shadow store");
        Self {
            engine: Arc::new(SyncEngine::new(Arc::new(docs), Arc::new(shadows))),
            _temp_dir: temp_dir,
        }
    }
}

impl Default for TempEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for building a [`SyncKey`].
#[must_use]
pub fn key(root: Option<&str>, path: &str, client_id: &str) -> SyncKey {
    SyncKey::new(root, path, client_id)
}

/// A simulated sync client running real convergence rounds.
///
/// Holds the client-side state the protocol assumes: a local text the
/// "user" edits and the client's own copy of its shadow. [`TestClient::sync`]
/// performs one full round - diff against the shadow, send with the
/// shadow checksum, fold the outgoing patch back into the local text.
pub struct TestClient<D, S> {
    engine: Arc<SyncEngine<D, S>>,
    delta: DeltaCodec,
    /// The key this client syncs under.
    pub key: SyncKey,
    /// The client's editable local text.
    pub local: String,
    /// The client's copy of its shadow.
    pub shadow: String,
}

impl<D, S> TestClient<D, S>
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    /// Registers with the server and adopts the returned shadow.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    #[must_use]
    pub fn register(engine: &Arc<SyncEngine<D, S>>, key: SyncKey, content: &str) -> Self {
        let shadow = engine
            .register(&key, content)
            .expect("registration failed");
        Self {
            engine: Arc::clone(engine),
            delta: DeltaCodec::new(),
            key,
            local: shadow.clone(),
            shadow,
        }
    }

    /// Runs one sync round, folding foreign edits into `local`.
    ///
    /// # Errors
    ///
    /// Propagates engine failures (conflicts included) without touching
    /// client state, mirroring the abort-before-mutate server behavior.
    pub fn sync(&mut self) -> SyncResult<()> {
        let block = self.delta.diff(&self.shadow, &self.local)?;
        let outgoing = self
            .engine
            .apply_patch(&self.key, &checksum(&self.shadow), &block)?;
        let (merged, _applied) = self.delta.apply(&outgoing, &self.local)?;
        self.local = merged;
        self.shadow = self.local.clone();
        Ok(())
    }

    /// Recovers from a conflict by re-adopting the server-side shadow.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    pub fn recover(&mut self) -> SyncResult<()> {
        self.shadow = self.engine.shadow_content(&self.key)?;
        self.local = self.shadow.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_engine_round() {
        let engine = memory_engine();
        let mut client = TestClient::register(&engine, key(None, "a.txt", "u1"), "hello");
        client.local = "hello world".into();
        client.sync().unwrap();
        assert_eq!(client.local, "hello world");
        assert_eq!(client.shadow, "hello world");
    }

    #[test]
    fn temp_engine_persists() {
        let fixture = TempEngine::new();
        let mut client =
            TestClient::register(&fixture.engine, key(Some("r1"), "a.txt", "u1"), "hello");
        client.local = "hello world".into();
        client.sync().unwrap();

        assert_eq!(
            fixture
                .engine
                .ensure_and_list_namespace("r1")
                .unwrap(),
            vec!["a.txt".to_string()]
        );
    }

    #[test]
    fn two_clients_converge() {
        let engine = memory_engine();
        let base = "one\ntwo\nthree\nfour\n";
        let mut alice = TestClient::register(&engine, key(None, "doc.txt", "alice"), base);
        let mut bob = TestClient::register(&engine, key(None, "doc.txt", "bob"), base);

        alice.local = "ONE\ntwo\nthree\nfour\n".into();
        alice.sync().unwrap();

        bob.local = "one\ntwo\nthree\nFOUR\n".into();
        bob.sync().unwrap();

        // bob's round merged alice's edit into his local copy
        assert!(bob.local.contains("ONE"));
        assert!(bob.local.contains("FOUR"));

        // one more round and alice sees bob's edit too
        alice.sync().unwrap();
        assert_eq!(alice.local, bob.local);
    }
}
