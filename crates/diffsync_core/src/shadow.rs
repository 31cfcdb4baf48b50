//! Shadow stores.
//!
//! A shadow is the server's record of what one client last synchronized
//! to. Protocol correctness does not depend on shadow durability - a lost
//! shadow only forces the client back through registration - so both an
//! in-memory and a durable file-backed store are provided. Linearizable
//! read-then-write per key is the engine's job, not the store's.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::key::SyncKey;

/// Keyed storage for the last-synchronized text per client.
pub trait ShadowStore: Send + Sync {
    /// Returns the shadow content for a key, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn get(&self, key: &SyncKey) -> SyncResult<Option<String>>;

    /// Stores the shadow content for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn put(&self, key: &SyncKey, content: &str) -> SyncResult<()>;

    /// Removes the shadow entry for a key; absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn remove(&self, key: &SyncKey) -> SyncResult<()>;

    /// Returns true if a shadow entry exists for the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn contains(&self, key: &SyncKey) -> SyncResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns the number of shadow entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn len(&self) -> SyncResult<usize>;

    /// Returns true if no shadow entries exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ShadowStore for Box<dyn ShadowStore> {
    fn get(&self, key: &SyncKey) -> SyncResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &SyncKey, content: &str) -> SyncResult<()> {
        (**self).put(key, content)
    }

    fn remove(&self, key: &SyncKey) -> SyncResult<()> {
        (**self).remove(key)
    }

    fn contains(&self, key: &SyncKey) -> SyncResult<bool> {
        (**self).contains(key)
    }

    fn len(&self) -> SyncResult<usize> {
        (**self).len()
    }
}

/// An in-memory shadow store.
///
/// Process-wide, lost on restart. The default for tests and acceptable in
/// production deployments that tolerate forced re-registration after a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryShadowStore {
    entries: RwLock<HashMap<SyncKey, String>>,
}

impl MemoryShadowStore {
    /// Creates a new empty in-memory shadow store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShadowStore for MemoryShadowStore {
    fn get(&self, key: &SyncKey) -> SyncResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &SyncKey, content: &str) -> SyncResult<()> {
        self.entries.write().insert(key.clone(), content.to_string());
        Ok(())
    }

    fn remove(&self, key: &SyncKey) -> SyncResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn len(&self) -> SyncResult<usize> {
        Ok(self.entries.read().len())
    }
}

/// One persisted shadow entry.
#[derive(Debug, Serialize, Deserialize)]
struct ShadowRecord {
    root: Option<String>,
    path: String,
    client_id: String,
    content: String,
}

/// A durable shadow store backed by a single JSON file.
///
/// The whole map is rewritten on every mutation with the
/// write-temp-then-rename discipline, so a crash leaves either the old or
/// the new map. Suitable for the per-data-directory shadow file
/// (`shadows.json`).
#[derive(Debug)]
pub struct FileShadowStore {
    path: PathBuf,
    entries: RwLock<HashMap<SyncKey, String>>,
}

impl FileShadowStore {
    /// Opens a shadow file, loading any existing entries.
    ///
    /// # Errors
    ///
    /// Returns `ShadowCorrupt` if the file exists but cannot be parsed,
    /// or an I/O error if it cannot be read.
    pub fn open(path: &Path) -> SyncResult<Self> {
        let entries = if path.is_file() {
            let data = fs::read_to_string(path)?;
            if data.trim().is_empty() {
                HashMap::new()
            } else {
                let records: Vec<ShadowRecord> = serde_json::from_str(&data)
                    .map_err(|err| SyncError::ShadowCorrupt(err.to_string()))?;
                records
                    .into_iter()
                    .map(|r| {
                        (
                            SyncKey::new(r.root.as_deref(), &r.path, &r.client_id),
                            r.content,
                        )
                    })
                    .collect()
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    /// Rewrites the shadow file from the given entries.
    ///
    /// Called with the write lock held, which serializes persists.
    fn persist(&self, entries: &HashMap<SyncKey, String>) -> SyncResult<()> {
        let mut records: Vec<ShadowRecord> = entries
            .iter()
            .map(|(key, content)| ShadowRecord {
                root: key.root.clone(),
                path: key.path.clone(),
                client_id: key.client_id.clone(),
                content: content.clone(),
            })
            .collect();
        records.sort_by(|a, b| {
            (&a.root, &a.path, &a.client_id).cmp(&(&b.root, &b.path, &b.client_id))
        });

        let data = serde_json::to_string_pretty(&records)
            .map_err(|err| SyncError::ShadowCorrupt(err.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl ShadowStore for FileShadowStore {
    fn get(&self, key: &SyncKey) -> SyncResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &SyncKey, content: &str) -> SyncResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.clone(), content.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &SyncKey) -> SyncResult<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn len(&self) -> SyncResult<usize> {
        Ok(self.entries.read().len())
    }
}
