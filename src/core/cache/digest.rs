//! Content hashing for cache validation
//!
//! Digests are SHA-256 over the raw bytes of a form definition file,
//! hex-encoded. Two files with identical bytes always share a digest.

use crate::domain::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Returns the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calculate the digest of raw bytes
///
/// # Examples
///
/// ```
/// use satchel::core::cache::digest::digest_bytes;
///
/// let digest = digest_bytes(b"{\"id\": \"visits\"}");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
pub fn digest_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest(format!("{:x}", hasher.finalize()))
}

/// Calculate the digest of a file's current bytes
///
/// The file is streamed, so large definitions are never held in memory twice.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> Result<Digest> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(Digest(format!("{:x}", hasher.finalize())))
}
