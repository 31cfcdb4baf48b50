//! # DiffSync Testkit
//!
//! Test utilities for DiffSync.
//!
//! This crate provides:
//! - Engine fixtures over in-memory and temp-directory stores
//! - A simulated sync client that runs real convergence rounds
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use diffsync_testkit::prelude::*;
//!
//! let engine = memory_engine();
//! let mut client = TestClient::register(&engine, key(None, "a.txt", "u1"), "hello");
//! client.local = "hello world".into();
//! client.sync().unwrap();
//! assert_eq!(client.local, "hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
