//! Tree command implementation.

use diffsync_store::{FileStore, NamespaceStore};
use std::path::Path;

/// Lists a namespace's entries, marking tombstones.
pub fn run(data_dir: &Path, root: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let entries = store.list_entries(root)?;

    if entries.is_empty() {
        println!("(empty)");
        return Ok(());
    }
    for (path, state) in entries {
        if state.is_tombstoned() {
            println!("{path}  (deleted)");
        } else {
            println!("{path}");
        }
    }
    Ok(())
}
