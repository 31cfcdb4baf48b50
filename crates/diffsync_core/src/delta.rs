//! The text-delta seam.
//!
//! The diff/patch algorithm itself (fuzzy matching, hunk encoding) is
//! delegated to the external diff-match-patch library. The engine consumes
//! it through exactly two operations: compute a serialized patch block
//! between two texts, and apply a serialized patch block to a text with a
//! per-hunk success vector. Patch internals never cross this boundary.
//!
//! `Compat` mode is used throughout: the serialized patch format stays
//! interoperable with the diff-match-patch ports running in clients.

use diff_match_patch_rs::{Compat, DiffMatchPatch, PatchInput};

use crate::error::{SyncError, SyncResult};

/// Codec for serialized text deltas.
///
/// # Example
///
/// ```rust
/// use diffsync_core::DeltaCodec;
///
/// let codec = DeltaCodec::new();
/// let block = codec.diff("hello", "hello world").unwrap();
/// let (patched, applied) = codec.apply(&block, "hello").unwrap();
/// assert_eq!(patched, "hello world");
/// assert!(applied.iter().all(|&ok| ok));
/// ```
pub struct DeltaCodec {
    dmp: DiffMatchPatch,
}

impl DeltaCodec {
    /// Creates a new delta codec with library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dmp: DiffMatchPatch::new(),
        }
    }

    /// Computes the serialized patch block transforming `before` into
    /// `after`.
    ///
    /// Equal inputs produce an empty block.
    ///
    /// # Errors
    ///
    /// Returns a `Delta` error if the library rejects the inputs.
    pub fn diff(&self, before: &str, after: &str) -> SyncResult<String> {
        let diffs = self
            .dmp
            .diff_main::<Compat>(before, after)
            .map_err(delta_err)?;
        let patches = self
            .dmp
            .patch_make(PatchInput::new_diffs(&diffs))
            .map_err(delta_err)?;
        Ok(self.dmp.patch_to_text(&patches))
    }

    /// Applies a serialized patch block to `text` with fuzzy matching.
    ///
    /// Returns the patched text and one success flag per hunk; a hunk
    /// whose context cannot be located reports `false` and leaves its
    /// region untouched. An empty block applies cleanly to anything.
    ///
    /// # Errors
    ///
    /// Returns a `Delta` error if the block is malformed.
    pub fn apply(&self, block: &str, text: &str) -> SyncResult<(String, Vec<bool>)> {
        let patches = self
            .dmp
            .patch_from_text::<Compat>(block)
            .map_err(delta_err)?;
        self.dmp.patch_apply(&patches, text).map_err(delta_err)
    }
}

impl Default for DeltaCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn delta_err(err: diff_match_patch_rs::Error) -> SyncError {
    SyncError::Delta(format!("{err:?}"))
}
