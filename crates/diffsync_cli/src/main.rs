//! DiffSync CLI
//!
//! Command-line tools for running and inspecting a DiffSync server.
//!
//! # Commands
//!
//! - `serve` - Run the sync server over a data directory
//! - `inspect` - Display namespace and shadow statistics
//! - `tree` - List a namespace's documents, tombstones included
//! - `checksum` - Print the sync checksum of a file's content

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DiffSync command-line tools.
#[derive(Parser)]
#[command(name = "diffsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync server
    Serve {
        /// Data directory for documents and shadows
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Worker thread count
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Keep shadows in memory instead of shadows.json
        #[arg(long)]
        volatile_shadows: bool,
    },

    /// Display namespace and shadow statistics
    Inspect {
        /// Data directory to inspect
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List a namespace's documents, tombstones included
    Tree {
        /// Data directory to inspect
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Namespace to list
        root: String,
    },

    /// Print the sync checksum of a file's content
    Checksum {
        /// File to checksum
        file: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            data_dir,
            bind,
            workers,
            volatile_shadows,
        } => {
            commands::serve::run(&data_dir, bind, workers, volatile_shadows)?;
        }
        Commands::Inspect { data_dir, format } => {
            commands::inspect::run(&data_dir, &format)?;
        }
        Commands::Tree { data_dir, root } => {
            commands::tree::run(&data_dir, &root)?;
        }
        Commands::Checksum { file } => {
            commands::checksum::run(&file)?;
        }
        Commands::Version => {
            println!("DiffSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
