//! Request handlers for the sync endpoints.
//!
//! Handlers translate protocol requests into engine calls and engine
//! outcomes into complete response bodies, including the failure bodies
//! the wire protocol defines (conflict responses carry the recovery
//! shadow). Only malformed input and internal faults propagate as
//! `ServerError`.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use diffsync_core::{checksum, ShadowStore, SyncEngine, SyncError, SyncKey};
use diffsync_protocol::{
    DeleteRequest, DeleteResponse, PatchRequest, PatchResponse, RegisterRequest, RegisterResponse,
    RootRequest, RootResponse,
};
use diffsync_store::{DocumentStore, NamespaceStore};

use crate::error::ServerResult;

/// Handler for sync requests.
pub struct RequestHandler<D, S> {
    engine: Arc<SyncEngine<D, S>>,
}

impl<D, S> Clone for RequestHandler<D, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<D, S> RequestHandler<D, S>
where
    D: DocumentStore + NamespaceStore,
    S: ShadowStore,
{
    /// Creates a new request handler over an engine.
    pub fn new(engine: Arc<SyncEngine<D, S>>) -> Self {
        Self { engine }
    }

    /// Returns the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<SyncEngine<D, S>> {
        &self.engine
    }

    /// Handles `/register`.
    ///
    /// Mints a `userId` when the client did not supply a usable one.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults; protocol-level failures are
    /// encoded in the response body.
    pub fn handle_register(&self, request: &RegisterRequest) -> ServerResult<RegisterResponse> {
        let user_id = request
            .user_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let key = SyncKey::new(request.root(), &request.path, &user_id);
        let content = request.content.as_deref().unwrap_or("");

        match self.engine.register(&key, content) {
            Ok(shadow) => Ok(RegisterResponse::ok(shadow, user_id)),
            Err(SyncError::FileDeleted { .. }) => {
                Ok(RegisterResponse::error(409, "File is deleted", Some(user_id)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Handles `/patch`, one convergence round.
    ///
    /// The shadow is read before the round; its checksum is echoed in
    /// the success body. A conflict answers 409 with the current shadow
    /// content so the client can resynchronize.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults; protocol-level failures are
    /// encoded in the response body.
    pub fn handle_patch(&self, request: &PatchRequest) -> ServerResult<PatchResponse> {
        if let Some(root) = request.root() {
            if !self.engine.namespace_exists(root)? {
                warn!(
                    client = %request.user_id,
                    root,
                    "patch against a root that does not exist"
                );
                return Ok(PatchResponse::error(404, "Root does not exist"));
            }
        }

        let key = SyncKey::new(request.root(), &request.path, &request.user_id);
        let shadow = match self.engine.shadow_content(&key) {
            Ok(shadow) => shadow,
            Err(SyncError::NotFound { .. }) => {
                return Ok(PatchResponse::error(404, "File not found"))
            }
            Err(err) => return Err(err.into()),
        };

        match self.engine.apply_patch(&key, &request.checksum, &request.patch) {
            Ok(outgoing) => Ok(PatchResponse::ok(outgoing, checksum(&shadow))),
            Err(SyncError::Conflict { .. }) => {
                let recovery = self.engine.shadow_content(&key).ok();
                Ok(PatchResponse::conflict(recovery))
            }
            Err(SyncError::FileDeleted { .. }) => {
                Ok(PatchResponse::error(409, "File is deleted"))
            }
            Err(SyncError::NotFound { .. }) => Ok(PatchResponse::error(404, "File not found")),
            Err(SyncError::Delta(reason)) => {
                warn!(key = %key, reason, "unparseable patch block");
                Ok(PatchResponse::error(400, "Malformed patch"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Handles `/root`: idempotent namespace creation plus listing.
    ///
    /// Mints a fresh root when the client did not supply a usable one.
    ///
    /// # Errors
    ///
    /// Propagates engine faults, including invalid namespace names.
    pub fn handle_root(&self, request: &RootRequest) -> ServerResult<RootResponse> {
        let root = match request.root() {
            Some(root) => root.to_string(),
            None => {
                let minted = Uuid::new_v4().to_string();
                info!(client = %request.user_id, root = %minted, "minting new root");
                minted
            }
        };
        let tree = self.engine.ensure_and_list_namespace(&root)?;
        Ok(RootResponse::ok(root, tree))
    }

    /// Handles `/delete`: tombstones a document.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults; protocol-level failures are
    /// encoded in the response body.
    pub fn handle_delete(&self, request: &DeleteRequest) -> ServerResult<DeleteResponse> {
        let key = SyncKey::new(request.root(), &request.path, &request.user_id);
        match self.engine.delete(&key) {
            Ok(content) => Ok(DeleteResponse::ok(content)),
            Err(SyncError::NotFound { .. }) => Ok(DeleteResponse::error(404, "File not found")),
            Err(SyncError::FileDeleted { .. }) => {
                Ok(DeleteResponse::error(409, "File is deleted"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
