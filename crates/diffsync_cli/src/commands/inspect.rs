//! Inspect command implementation.

use diffsync_core::{FileShadowStore, ShadowStore};
use diffsync_store::{FileStore, NamespaceStore};
use serde::Serialize;
use std::path::Path;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub data_dir: String,
    /// Per-namespace statistics.
    pub namespaces: Vec<NamespaceStats>,
    /// Number of shadow entries in shadows.json.
    pub shadow_entries: usize,
}

/// Statistics for a single namespace.
#[derive(Debug, Serialize)]
pub struct NamespaceStats {
    /// Namespace name.
    pub namespace: String,
    /// Live documents.
    pub live: usize,
    /// Tombstoned documents.
    pub tombstoned: usize,
}

/// Runs the inspect command.
pub fn run(data_dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let shadows = FileShadowStore::open(&store.shadow_path())?;

    let mut namespaces = Vec::new();
    for namespace in store.list_namespaces()? {
        let entries = store.list_entries(&namespace)?;
        let tombstoned = entries
            .iter()
            .filter(|(_, state)| state.is_tombstoned())
            .count();
        namespaces.push(NamespaceStats {
            live: entries.len() - tombstoned,
            tombstoned,
            namespace,
        });
    }

    let result = InspectResult {
        data_dir: data_dir.display().to_string(),
        namespaces,
        shadow_entries: shadows.len()?,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Data directory: {}", result.data_dir);
            println!("Shadow entries: {}", result.shadow_entries);
            println!("Namespaces ({}):", result.namespaces.len());
            for stats in &result.namespaces {
                println!(
                    "  {}  {} live, {} tombstoned",
                    stats.namespace, stats.live, stats.tombstoned
                );
            }
        }
    }

    Ok(())
}
