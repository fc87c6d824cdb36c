// crates/cogni-core/src/hashing.rs
// ============================================================================
// Module: Content Hashing
// Description: SHA-256 hashing of raw specification/rule bytes.
// Purpose: Give the spec cache a stable content key independent of formatting.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! The spec cache keys entries by `(repo_id, ref, sha256(raw_bytes))`. Hashing
//! operates on the raw bytes fetched from the host, never on a re-serialized
//! form, so two byte-identical files always hash identically regardless of
//! how the YAML was parsed.

use sha2::Digest;
use sha2::Sha256;

/// Lowercase hex-encoded SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex_encode(&digest)
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
