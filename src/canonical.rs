//! Content hashing for tile deduplication and document fingerprints.
//!
//! Tiles are deduplicated on the SHA-256 digest of their serialized text
//! (`(path{k = v},path)`), so two tiles share a legend entry exactly when
//! they would be written identically.
//!
//! Document fingerprints use xxh64 over canonical JSON, which is cheap and
//! only needs to be stable within one build.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// SHA-256 digest of a serialized tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHash([u8; 32]);

impl TileHash {
    /// Digest the serialized form of a tile.
    pub fn of(serialized: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Callers must only pass ordered containers (`Vec`, `BTreeMap`).
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Serializing plain data (strings, integers, sequences) cannot fail.
    serde_json::to_vec(value).unwrap_or_default()
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
