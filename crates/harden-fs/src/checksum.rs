//! SHA-256 checksum utilities
//!
//! Snapshots record a checksum of the bytes they captured (`sha256:<hex>`), so
//! a restore can be verified against what was actually backed up.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Result, io};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let content = io::read_bytes(path)?;
    Ok(compute_bytes_checksum(&content))
}
