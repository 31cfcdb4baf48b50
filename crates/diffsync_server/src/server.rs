//! Main sync server.

use std::sync::Arc;

use diffsync_core::{FileShadowStore, MemoryShadowStore, ShadowStore, SyncEngine};
use diffsync_protocol::{
    DeleteRequest, DeleteResponse, PatchRequest, PatchResponse, RegisterRequest, RegisterResponse,
    RootRequest, RootResponse,
};
use diffsync_store::{DocumentStore, FileStore, MemoryStore, NamespaceStore};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use crate::http;

/// The sync server.
///
/// Owns the engine and its stores, exposes the endpoint handlers, and
/// serves them over HTTP via [`SyncServer::serve`].
pub struct SyncServer<D, S> {
    config: ServerConfig,
    handler: RequestHandler<D, S>,
}

/// A server over a locked data directory.
pub type FileSyncServer = SyncServer<FileStore, Box<dyn ShadowStore>>;

/// A fully in-memory server, for tests and ephemeral deployments.
pub type MemorySyncServer = SyncServer<MemoryStore, MemoryShadowStore>;

impl FileSyncServer {
    /// Opens the data directory and builds the engine on top of it.
    ///
    /// Shadows go to `shadows.json` in the data directory unless the
    /// config asks for volatile shadows.
    ///
    /// # Errors
    ///
    /// Fails if the data directory cannot be locked or the shadow file
    /// is unreadable.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let docs = FileStore::open(&config.data_dir)?;
        let shadows: Box<dyn ShadowStore> = if config.durable_shadows {
            Box::new(FileShadowStore::open(&docs.shadow_path())?)
        } else {
            Box::new(MemoryShadowStore::new())
        };
        let engine = SyncEngine::new(Arc::new(docs), Arc::new(shadows));
        Ok(Self {
            config,
            handler: RequestHandler::new(Arc::new(engine)),
        })
    }
}

impl MemorySyncServer {
    /// Creates a server over in-memory stores.
    #[must_use]
    pub fn in_memory(config: ServerConfig) -> Self {
        let engine = SyncEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryShadowStore::new()),
        );
        Self {
            config,
            handler: RequestHandler::new(Arc::new(engine)),
        }
    }
}

impl<D, S> SyncServer<D, S>
where
    D: DocumentStore + NamespaceStore + 'static,
    S: ShadowStore + 'static,
{
    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the request handler.
    #[must_use]
    pub fn handler(&self) -> &RequestHandler<D, S> {
        &self.handler
    }

    /// Handles a `/register` request.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults.
    pub fn handle_register(&self, request: &RegisterRequest) -> ServerResult<RegisterResponse> {
        self.handler.handle_register(request)
    }

    /// Handles a `/patch` request.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults.
    pub fn handle_patch(&self, request: &PatchRequest) -> ServerResult<PatchResponse> {
        self.handler.handle_patch(request)
    }

    /// Handles a `/root` request.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults.
    pub fn handle_root(&self, request: &RootRequest) -> ServerResult<RootResponse> {
        self.handler.handle_root(request)
    }

    /// Handles a `/delete` request.
    ///
    /// # Errors
    ///
    /// Propagates internal engine faults.
    pub fn handle_delete(&self, request: &DeleteRequest) -> ServerResult<DeleteResponse> {
        self.handler.handle_delete(request)
    }

    /// Binds the configured address and serves requests until the
    /// process exits.
    ///
    /// # Errors
    ///
    /// Fails if the listener cannot be bound.
    pub fn serve(self) -> ServerResult<()> {
        http::serve(&self.config, self.handler)
    }
}
