//! Error types for protocol encoding and decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request body is not valid JSON or misses a required field.
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{JsonMessage, PatchRequest};

    #[test]
    fn missing_field_reports_malformed() {
        let err = PatchRequest::from_json(r#"{"path": "a.txt"}"#).unwrap_err();
        assert!(err.to_string().starts_with("malformed request"));
    }
}
