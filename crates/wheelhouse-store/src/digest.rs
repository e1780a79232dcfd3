//! # SHA-256 Content Digests
//!
//! Streaming SHA-256 over artifact bytes. Files are read in fixed-size
//! chunks so hashing a large wheel does not load it into memory.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::StoreError;

const CHUNK_SIZE: usize = 64 * 1024;

/// A raw 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Digest([u8; 32]);

impl Sha256Digest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash everything `reader` yields until EOF.
pub fn sha256_reader<R: Read>(mut reader: R) -> std::io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(Sha256Digest(hasher.finalize().into()))
}

/// Hash the file at `path`. The handle is closed before returning.
pub fn sha256_file(path: &Path) -> Result<Sha256Digest, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    sha256_reader(file).map_err(|e| StoreError::io(path, e))
}
