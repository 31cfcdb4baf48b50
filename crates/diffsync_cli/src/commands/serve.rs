//! Serve command implementation.

use diffsync_server::{ServerConfig, SyncServer};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

/// Runs the sync server until the process exits.
pub fn run(
    data_dir: &Path,
    bind: SocketAddr,
    workers: usize,
    volatile_shadows: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::new(data_dir)
        .with_bind_addr(bind)
        .with_worker_threads(workers);
    if volatile_shadows {
        config = config.with_volatile_shadows();
    }

    info!(data_dir = %data_dir.display(), "opening data directory");
    let server = SyncServer::open(config)?;
    server.serve()?;
    Ok(())
}
