//! Utility functions used by probe operations.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the file's contents, read in a streaming fashion.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn file_checksum(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
