//! File-based document store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK                  # Advisory lock, single-process ownership
//! ├─ shadows.json          # Durable shadow map (written by diffsync_core)
//! ├─ plain.txt             # Non-namespaced document
//! └─ <namespace>/
//!    ├─ a.txt              # Live document
//!    ├─ DELETED_b.txt      # Tombstoned document (content recoverable)
//!    └─ sub/c.txt          # Nested document
//! ```
//!
//! A tombstone is a rename to the reserved `DELETED_` prefix. The marker
//! wins over a live sibling, so the store resolves every address to a
//! single [`DocState`] and callers never inspect file names.

use crate::error::{StoreError, StoreResult};
use crate::path::{display_key, validate_namespace, validate_rel_path};
use crate::store::{DocState, DocumentStore, NamespaceStore};
use fs2::FileExt;
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Advisory lock file at the data directory root.
pub const LOCK_FILE: &str = "LOCK";
/// Durable shadow map file at the data directory root.
pub const SHADOW_FILE: &str = "shadows.json";
/// Reserved base-name prefix marking a tombstoned document.
pub const TOMBSTONE_PREFIX: &str = "DELETED_";

/// Counter for unique temp file names; two clients of the same document
/// may write concurrently.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A file-based document store rooted at a locked data directory.
///
/// # Durability
///
/// Writes go to a temporary file which is synced and renamed over the
/// target, so readers observe either the old or the new content. Renames
/// are followed by a directory fsync on Unix.
///
/// # Thread Safety
///
/// All operations take `&self` and are safe to call from concurrent
/// request handlers; per-client atomicity is enforced above the store by
/// the sync engine's key locks.
///
/// # Example
///
/// ```no_run
/// use diffsync_store::{DocumentStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data")).unwrap();
/// store.write(Some("r1"), "a.txt", "hello").unwrap();
/// assert_eq!(store.read(Some("r1"), "a.txt").unwrap(), "hello");
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a data directory and takes its exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another process holds the data directory, or an
    /// I/O error if the directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;

        let lock_path = root.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        Ok(Self {
            root: root.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the data directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the durable shadow map file.
    #[must_use]
    pub fn shadow_path(&self) -> PathBuf {
        self.root.join(SHADOW_FILE)
    }

    fn resolve(&self, namespace: Option<&str>, path: &str) -> StoreResult<PathBuf> {
        if let Some(ns) = namespace {
            validate_namespace(ns)?;
        }
        validate_rel_path(path)?;

        let mut full = self.root.clone();
        if let Some(ns) = namespace {
            full.push(ns);
        }
        for segment in path.split('/') {
            full.push(segment);
        }
        Ok(full)
    }

    fn tombstone_sibling(full: &Path) -> PathBuf {
        // resolve() guarantees a final segment exists
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        full.with_file_name(format!("{TOMBSTONE_PREFIX}{name}"))
    }

    fn walk(dir: &Path, prefix: &str, out: &mut Vec<(String, DocState)>) -> StoreResult<()> {
        let mut tombstoned = BTreeSet::new();
        let mut live = BTreeSet::new();
        let mut subdirs = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                subdirs.push(name);
                continue;
            }
            if name.starts_with('.') || name == LOCK_FILE || name == SHADOW_FILE {
                continue;
            }
            match name.strip_prefix(TOMBSTONE_PREFIX) {
                Some(base) => {
                    tombstoned.insert(base.to_string());
                }
                None => {
                    live.insert(name);
                }
            }
        }

        for name in &tombstoned {
            out.push((format!("{prefix}{name}"), DocState::Tombstoned));
        }
        for name in live {
            if !tombstoned.contains(&name) {
                out.push((format!("{prefix}{name}"), DocState::Live));
            }
        }
        for sub in subdirs {
            Self::walk(&dir.join(&sub), &format!("{prefix}{sub}/"), out)?;
        }
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn state(&self, namespace: Option<&str>, path: &str) -> StoreResult<DocState> {
        let full = self.resolve(namespace, path)?;
        if Self::tombstone_sibling(&full).exists() {
            Ok(DocState::Tombstoned)
        } else if full.is_file() {
            Ok(DocState::Live)
        } else {
            Ok(DocState::Absent)
        }
    }

    fn read(&self, namespace: Option<&str>, path: &str) -> StoreResult<String> {
        let full = self.resolve(namespace, path)?;
        if self.state(namespace, path)? != DocState::Live {
            return Err(StoreError::not_found(display_key(namespace, path)));
        }
        Ok(fs::read_to_string(full)?)
    }

    fn write(&self, namespace: Option<&str>, path: &str, content: &str) -> StoreResult<()> {
        let full = self.resolve(namespace, path)?;
        let parent = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent)?;

        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = parent.join(format!(
            ".{name}.{}.tmp",
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut file = File::create(&temp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &full)?;
        sync_directory(&parent)?;
        Ok(())
    }

    fn tombstone(&self, namespace: Option<&str>, path: &str) -> StoreResult<()> {
        let full = self.resolve(namespace, path)?;
        match self.state(namespace, path)? {
            DocState::Tombstoned => Ok(()),
            DocState::Live => {
                let marker = Self::tombstone_sibling(&full);
                fs::rename(&full, &marker)?;
                let parent = full
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                sync_directory(&parent)?;
                tracing::debug!(key = %display_key(namespace, path), "tombstoned document");
                Ok(())
            }
            DocState::Absent => Err(StoreError::not_found(display_key(namespace, path))),
        }
    }
}

impl NamespaceStore for FileStore {
    fn ensure_namespace(&self, namespace: &str) -> StoreResult<()> {
        validate_namespace(namespace)?;
        fs::create_dir_all(self.root.join(namespace))?;
        Ok(())
    }

    fn namespace_exists(&self, namespace: &str) -> StoreResult<bool> {
        validate_namespace(namespace)?;
        Ok(self.root.join(namespace).is_dir())
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
        let dir = self.root.join(namespace);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        Self::walk(&dir, "", &mut out)?;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn list_namespaces(&self) -> StoreResult<Vec<String>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

/// Syncs a directory so renames and unlinks are durable.
///
/// On Windows the NTFS journal provides metadata durability; there is no
/// directory fsync equivalent.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> StoreResult<()> {
    let handle = File::open(dir)?;
    handle.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StoreResult<()> {
    Ok(())
}
