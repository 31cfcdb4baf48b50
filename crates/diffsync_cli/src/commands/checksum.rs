//! Checksum command implementation.

use diffsync_core::checksum;
use std::fs;
use std::path::Path;

/// Prints the sync checksum of a file's content.
pub fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file)?;
    println!("{}", checksum(&content));
    Ok(())
}
