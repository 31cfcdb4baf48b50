//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Data directory holding documents, tombstones, and shadows.
    pub data_dir: PathBuf,
    /// Number of worker threads pulling from the listener.
    pub worker_threads: usize,
    /// Persist shadows to `shadows.json`; when false, shadows live in
    /// memory and clients re-register after a restart.
    pub durable_shadows: bool,
}

impl ServerConfig {
    /// Creates a configuration for the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_dir: data_dir.into(),
            worker_threads: 4,
            durable_shadows: true,
        }
    }

    /// Sets the bind address.
    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn with_worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = workers.max(1);
        self
    }

    /// Keeps shadows in memory instead of `shadows.json`.
    #[must_use]
    pub fn with_volatile_shadows(mut self) -> Self {
        self.durable_shadows = false;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("data")
    }
}
