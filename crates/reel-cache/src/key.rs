//! Deterministic cache key derivation.

use sha2::{Digest, Sha256};

/// Cache format version, embedded in every key so format changes miss
/// naturally instead of reading stale entries.
pub const CACHE_VERSION: &str = "v1";

/// Derive a stable hex key from an ordered list of semantically relevant
/// strings. Identical logical inputs produce identical keys across runs.
pub fn make_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CACHE_VERSION.as_bytes());
    for part in parts {
        hasher.update(b"||");
        hasher.update(part.as_bytes());
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
