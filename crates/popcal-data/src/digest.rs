//! SHA-256 digests recorded in run provenance.

use std::fs;
use std::path::Path;

use popcal_core::errors::CalibError;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the given bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String, CalibError> {
    let bytes = fs::read(path).map_err(|err| CalibError::io("digest-read", path, err))?;
    Ok(sha256_hex(&bytes))
}
