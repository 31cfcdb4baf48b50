//! # DiffSync Server
//!
//! Reference HTTP sync server for DiffSync.
//!
//! This crate provides:
//! - Request handlers for the four endpoints (register, patch, root,
//!   delete)
//! - Typed error to status code mapping (400/404/409/500)
//! - A thread-per-request HTTP front over the engine
//! - Server configuration
//!
//! # Architecture
//!
//! The server is thin by design: every request decodes into a
//! [`diffsync_protocol`] type, maps to one engine call, and encodes the
//! result. All synchronization semantics - checksum gating, best-effort
//! merge, tombstones - live in [`diffsync_core`]; the handlers only
//! translate outcomes into wire responses, including the conflict body
//! that carries the recovery shadow.
//!
//! `secretKey` is accepted on the wire and never validated; deployments
//! that need authentication put it in front of this server.
//!
//! # Example
//!
//! ```rust
//! use diffsync_protocol::RegisterRequest;
//! use diffsync_server::{ServerConfig, SyncServer};
//!
//! let server = SyncServer::in_memory(ServerConfig::default());
//! let response = server
//!     .handle_register(&RegisterRequest {
//!         path: "a.txt".into(),
//!         root: None,
//!         user_id: Some("u1".into()),
//!         content: Some("hello".into()),
//!         secret_key: None,
//!     })
//!     .unwrap();
//! assert_eq!(response.status, 200);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::{FileSyncServer, MemorySyncServer, SyncServer};
