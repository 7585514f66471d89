//! Hashing helpers.
//!
//! - `fingerprint()` uses `rustc_hash::FxHasher` for short, fast, non-cryptographic ids
//! - `digest_hex()` uses blake3 for cache file names, where collisions across
//!   tenants must not happen

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Compute hash and return as 8-char hex fingerprint.
///
/// Used for debug ids attached to transformed elements.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    format!("{:016x}", compute(value))[..8].to_string()
}

/// Full blake3 digest as lowercase hex.
#[inline]
pub fn digest_hex<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    hex::encode(blake3::hash(value.as_ref()).as_bytes())
}
