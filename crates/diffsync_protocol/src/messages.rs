//! Request and response types for the four sync endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;

/// JSON encoding for protocol messages.
pub trait JsonMessage: Serialize + DeserializeOwned {
    /// Encodes the message as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a message from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON or misses a
    /// required field.
    fn from_json(data: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Returns the value unless it is absent or a JavaScript null literal.
fn none_literal(value: Option<&str>) -> Option<&str> {
    match value {
        Some("null") | Some("undefined") | None => None,
        Some(other) => Some(other),
    }
}

/// Body of `POST /v1/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Document path relative to the root.
    pub path: String,
    /// Namespace (tenant root), if any.
    #[serde(default)]
    pub root: Option<String>,
    /// Client identifier; the server mints one when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    /// The content the client claims to have.
    #[serde(default)]
    pub content: Option<String>,
    /// Accepted, not validated; authentication is a collaborator concern.
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl RegisterRequest {
    /// The client id with JS null literals normalized away.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        none_literal(self.user_id.as_deref())
    }

    /// The root with JS null literals normalized away.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        none_literal(self.root.as_deref())
    }
}

/// Body of a `/register` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// The shadow content on success, a message on failure.
    pub content: Option<String>,
    /// The (possibly server-minted) client identifier.
    pub user_id: Option<String>,
}

impl RegisterResponse {
    /// Successful registration.
    #[must_use]
    pub fn ok(content: String, user_id: String) -> Self {
        Self {
            status: 200,
            content: Some(content),
            user_id: Some(user_id),
        }
    }

    /// Failed registration with a message in `content`.
    #[must_use]
    pub fn error(status: u16, message: &str, user_id: Option<String>) -> Self {
        Self {
            status,
            content: Some(message.to_string()),
            user_id,
        }
    }
}

/// Body of `POST /v1/patch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    /// Document path relative to the root.
    pub path: String,
    /// Checksum of the client's shadow before its edit.
    pub checksum: String,
    /// Serialized patch block computed against the shadow.
    pub patch: String,
    /// Client identifier.
    pub user_id: String,
    /// Accepted, not validated.
    pub secret_key: String,
    /// Namespace (tenant root), if any.
    #[serde(default)]
    pub root: Option<String>,
}

impl PatchRequest {
    /// The root with JS null literals normalized away.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        none_literal(self.root.as_deref())
    }
}

/// Body of a `/patch` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// The outgoing patch block (foreign edits), empty when none.
    pub patch: String,
    /// Checksum of the shadow the round was based on.
    pub checksum: String,
    /// `None` on success; the recovery shadow content on conflict, or a
    /// message on other failures.
    pub content: Option<String>,
}

impl PatchResponse {
    /// Successful patch round.
    #[must_use]
    pub fn ok(patch: String, checksum: String) -> Self {
        Self {
            status: 200,
            patch,
            checksum,
            content: None,
        }
    }

    /// Conflict carrying the current shadow content for recovery.
    #[must_use]
    pub fn conflict(shadow: Option<String>) -> Self {
        Self {
            status: 409,
            patch: String::new(),
            checksum: String::new(),
            content: shadow,
        }
    }

    /// Failed round with a message in `content`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            patch: String::new(),
            checksum: String::new(),
            content: Some(message.to_string()),
        }
    }
}

/// Body of `POST /v1/root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootRequest {
    /// Client identifier.
    pub user_id: String,
    /// Accepted, not validated.
    pub secret_key: String,
    /// Namespace to create or list; the server mints one when absent.
    #[serde(default)]
    pub root: Option<String>,
}

impl RootRequest {
    /// The root with JS null literals normalized away.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        none_literal(self.root.as_deref())
    }
}

/// Body of a `/root` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// The (possibly server-minted) namespace.
    pub root: String,
    /// Relative paths of the namespace's live documents.
    pub tree: Option<Vec<String>>,
}

impl RootResponse {
    /// Successful namespace creation/listing.
    #[must_use]
    pub fn ok(root: String, tree: Vec<String>) -> Self {
        Self {
            status: 200,
            root,
            tree: Some(tree),
        }
    }
}

/// Body of `POST /v1/delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Document path relative to the root.
    pub path: String,
    /// Namespace (tenant root).
    pub root: String,
    /// Client identifier.
    pub user_id: String,
    /// Accepted, not validated.
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl DeleteRequest {
    /// The root with JS null literals normalized away.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        none_literal(Some(self.root.as_str()))
    }
}

/// Body of a `/delete` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// The last live content on success, a message on failure.
    pub content: Option<String>,
}

impl DeleteResponse {
    /// Successful deletion, returning the removed content.
    #[must_use]
    pub fn ok(content: String) -> Self {
        Self {
            status: 200,
            content: Some(content),
        }
    }

    /// Failed deletion with a message in `content`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content: Some(message.to_string()),
        }
    }
}

impl JsonMessage for RegisterRequest {}
impl JsonMessage for RegisterResponse {}
impl JsonMessage for PatchRequest {}
impl JsonMessage for PatchResponse {}
impl JsonMessage for RootRequest {}
impl JsonMessage for RootResponse {}
impl JsonMessage for DeleteRequest {}
impl JsonMessage for DeleteResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_camel_case() {
        let req = RegisterRequest::from_json(
            r#"{"path": "a.txt", "root": "r1", "userId": "u1", "content": "hello"}"#,
        )
        .unwrap();
        assert_eq!(req.path, "a.txt");
        assert_eq!(req.user_id(), Some("u1"));
        assert_eq!(req.root(), Some("r1"));
    }

    #[test]
    fn register_request_minimal() {
        let req = RegisterRequest::from_json(r#"{"path": "a.txt"}"#).unwrap();
        assert!(req.user_id().is_none());
        assert!(req.root().is_none());
        assert!(req.content.is_none());
    }

    #[test]
    fn js_null_literals_normalize() {
        let req = RegisterRequest::from_json(
            r#"{"path": "a.txt", "root": "undefined", "userId": "null"}"#,
        )
        .unwrap();
        assert!(req.user_id().is_none());
        assert!(req.root().is_none());
    }

    #[test]
    fn patch_request_requires_all_fields() {
        assert!(PatchRequest::from_json(
            r#"{"path": "a", "checksum": "c", "patch": "p", "userId": "u"}"#
        )
        .is_err());

        let req = PatchRequest::from_json(
            r#"{"path": "a", "checksum": "c", "patch": "p", "userId": "u", "secretKey": "s"}"#,
        )
        .unwrap();
        assert!(req.root().is_none());
    }

    #[test]
    fn patch_response_wire_shape() {
        let json = PatchResponse::ok("@@p".into(), "abc".into()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["patch"], "@@p");
        assert_eq!(value["checksum"], "abc");
        assert!(value["content"].is_null());
    }

    #[test]
    fn conflict_response_carries_shadow() {
        let resp = PatchResponse::conflict(Some("shadow text".into()));
        assert_eq!(resp.status, 409);
        assert_eq!(resp.content.as_deref(), Some("shadow text"));
        assert!(resp.patch.is_empty());
    }

    #[test]
    fn register_response_uses_user_id_key() {
        let json = RegisterResponse::ok("hello".into(), "u1".into())
            .to_json()
            .unwrap();
        assert!(json.contains("\"userId\":\"u1\""));
    }

    #[test]
    fn root_and_delete_round_trip() {
        let req = RootRequest::from_json(r#"{"userId": "u1", "secretKey": "s"}"#).unwrap();
        assert!(req.root().is_none());

        let resp = RootResponse::ok("r1".into(), vec!["a.txt".into()]);
        let back = RootResponse::from_json(&resp.to_json().unwrap()).unwrap();
        assert_eq!(back.tree.unwrap(), vec!["a.txt".to_string()]);

        let req = DeleteRequest::from_json(
            r#"{"path": "a.txt", "root": "r1", "userId": "u1"}"#,
        )
        .unwrap();
        assert_eq!(req.root(), Some("r1"));
    }
}
