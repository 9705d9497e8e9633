//! Cryptographic helpers for token handling
//!
//! Hash comparison on the rotation path must not leak where two hashes
//! diverge, so all comparisons here run in constant time.

use sha2::{Digest, Sha256};

/// Constant-time byte slice comparison.
///
/// Comparison time depends only on the length of the slices, not on
/// their contents.
///
/// # Security
/// - Returns `false` immediately if lengths differ (length is not secret)
/// - Compares all bytes even after finding a difference
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let result = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));

    result == 0
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Hash a token for storage.
///
/// SHA-256, hex encoded. Raw refresh tokens are never persisted; only
/// these hashes reach the session store.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
