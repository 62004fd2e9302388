// src/core/hash.rs

//! The deterministic content hash of a resolved tag set.

use bytes::Bytes;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Hashes `tags` as a 64-bit FNV-1a of the concatenation of the
/// lexicographically sorted tags, formatted as lowercase hex. Empty input
/// yields the empty string rather than the hash of zero bytes, since an
/// entity with no resolved tags has no meaningful content hash.
pub fn tags_hash(tags: &[Bytes]) -> String {
    if tags.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&Bytes> = tags.iter().collect();
    sorted.sort_unstable();

    let mut hash = FNV_OFFSET_BASIS;
    for tag in sorted {
        for &byte in tag.as_ref() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    format!("{hash:016x}")
}
