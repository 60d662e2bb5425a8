//! SHA-256 helpers for the hash chain and content digests.

use sha2::{Digest, Sha256};

/// Hash a string and return the lowercase hex digest.
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest arbitrary content for an audit entry's `input_digest` /
/// `output_digest` fields.
///
/// Content is truncated before hashing so that pathological payloads do
/// not dominate append latency; the digest still changes with any edit
/// inside the bound.
pub fn digest(content: &str) -> String {
    const DIGEST_BOUND: usize = 64 * 1024;
    let bounded: &str = if content.len() > DIGEST_BOUND {
        // Cut at a char boundary at or below the bound.
        let mut end = DIGEST_BOUND;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        &content[..end]
    } else {
        content
    };
    sha256_hex(bounded)
}
