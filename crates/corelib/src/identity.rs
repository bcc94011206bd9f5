//! Record identity for harvested files

use sha2::{Digest, Sha256};

use crate::types::Measures;

/// Folds the first eight bytes of the SHA-256 digest of `content` into a u64.
pub fn content_hash(content: &str) -> u64 {
    let digest = Sha256::digest(content.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Identity of a file record: hash of the source, hash of the name and the
/// number of rule occurrences across all categories, added with wraparound.
///
/// Reproducible for the same inputs in any run. Not collision free.
pub fn record_id(source_code: &str, name: &str, measures: &Measures) -> u64 {
    content_hash(source_code)
        .wrapping_add(content_hash(name))
        .wrapping_add(measures.occurrence_count() as u64)
}
