//! Error types for the sync server.

use diffsync_core::SyncError;
use diffsync_protocol::ProtocolError;
use diffsync_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body is malformed or misses a required field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Engine failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The HTTP listener could not be started.
    #[error("http server error: {0}")]
    Http(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtocolError> for ServerError {
    fn from(err: ProtocolError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        Self::Sync(err.into())
    }
}

impl ServerError {
    /// Maps the error to the HTTP status code the transport answers with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::Sync(SyncError::NotFound { .. }) => 404,
            ServerError::Sync(SyncError::FileDeleted { .. })
            | ServerError::Sync(SyncError::Conflict { .. }) => 409,
            ServerError::Sync(SyncError::Delta(_)) => 400,
            ServerError::Sync(SyncError::Store(StoreError::InvalidPath { .. })) => 400,
            _ => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
