//! Content hashing for cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Number of hex characters kept by [`short_hash`].
pub const SHORT_HASH_LEN: usize = 16;

/// SHA-256 of the JSON form of `value`, as 64 lowercase hex characters.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Prefix of [`compute_hash`], short enough to keep keys readable.
pub fn short_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut hash = compute_hash(value)?;
    hash.truncate(SHORT_HASH_LEN);
    Ok(hash)
}
