//! # DiffSync Core
//!
//! Differential synchronization engine for DiffSync.
//!
//! This crate provides:
//! - [`SyncKey`] identifying one client's view of one document
//! - Content checksums for conflict detection
//! - The text-delta seam over the external diff-match-patch library
//! - Shadow stores (in-memory and durable)
//! - [`SyncEngine`], the checksum-gated patch exchange algorithm
//!
//! ## The Algorithm
//!
//! Every client keeps its own offline copy of a document; the server keeps
//! one **shadow** per `(namespace, path, client)` recording what that
//! client last synchronized to. A patch round sends the client's delta
//! plus a checksum of its shadow. The engine refuses the patch unless the
//! checksum proves the client's baseline matches the server's shadow
//! (hard gate), then merges the delta into the live document best-effort
//! (other clients may have written meanwhile) and answers with the delta
//! between the client's expectation and the document's true content.
//!
//! ## Key Invariants
//!
//! - A failed patch mutates nothing; the client recovers by reading its
//!   shadow and re-registering
//! - After a successful patch the shadow equals the live document
//! - Per-key operations are serialized; different clients of the same
//!   document deliberately are not

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod delta;
mod engine;
mod error;
mod key;
mod shadow;

pub use checksum::checksum;
pub use delta::DeltaCodec;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use key::SyncKey;
pub use shadow::{FileShadowStore, MemoryShadowStore, ShadowStore};
