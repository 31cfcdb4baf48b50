//! Sync key: one client's view of one document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniquely identifies one client's view of one document.
///
/// Multiple clients sharing the same `(root, path)` each get their own
/// shadow; there is exactly one live document record for the pair. An
/// absent `root` addresses the flat, non-namespaced document space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncKey {
    /// Namespace (tenant root), if any.
    pub root: Option<String>,
    /// Document path relative to the namespace root.
    pub path: String,
    /// The client this shadow belongs to.
    pub client_id: String,
}

impl SyncKey {
    /// Creates a new sync key.
    pub fn new(root: Option<&str>, path: &str, client_id: &str) -> Self {
        Self {
            root: root.map(str::to_string),
            path: path.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Returns the namespace component, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.root.as_deref()
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{root}/{}@{}", self.path, self.client_id),
            None => write!(f, "{}@{}", self.path, self.client_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let key = SyncKey::new(Some("r1"), "sub/a.txt", "u1");
        assert_eq!(key.to_string(), "r1/sub/a.txt@u1");

        let flat = SyncKey::new(None, "a.txt", "u2");
        assert_eq!(flat.to_string(), "a.txt@u2");
    }

    #[test]
    fn keys_distinguish_clients() {
        let a = SyncKey::new(Some("r1"), "a.txt", "u1");
        let b = SyncKey::new(Some("r1"), "a.txt", "u2");
        assert_ne!(a, b);
    }

    #[test]
    fn serde_round_trip() {
        let key = SyncKey::new(None, "a.txt", "u1");
        let json = serde_json::to_string(&key).unwrap();
        let back: SyncKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
