//! # DiffSync Protocol
//!
//! Wire protocol types for the DiffSync HTTP API.
//!
//! This crate provides:
//! - Request types for the four endpoints (register, patch, root, delete)
//! - Response types carrying an HTTP-style status alongside the payload
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations. Field names on
//! the wire are camelCase (`userId`, `secretKey`) to match the JavaScript
//! clients; the literals `"null"` and `"undefined"`, which those clients
//! emit for absent values, normalize to absent.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    DeleteRequest, DeleteResponse, JsonMessage, PatchRequest, PatchResponse, RegisterRequest,
    RegisterResponse, RootRequest, RootResponse,
};
