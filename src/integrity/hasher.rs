//! SHA-256 over files and in-memory buffers.

use crate::error::{Result, ResultExt as _};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 8192;

/// Hash algorithm identifier used in receipts.
pub const HASH_ALGORITHM: &str = "SHA-256";

fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex SHA-256 of a file, read in fixed-size chunks.
///
/// Memory use is constant (one 8 KiB buffer) regardless of file size.
///
/// # Errors
///
/// Returns error if the file cannot be opened or a read fails.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    hash_reader(BufReader::with_capacity(BUFFER_SIZE, file))
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Lowercase hex SHA-256 of a buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
