//! Per-chunk content digests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Computes the integrity digest sent alongside a chunk.
///
/// Implementations must be pure: the same bytes always yield the same
/// string, and no state is carried between calls.
pub trait ChunkDigestEngine: Send + Sync {
    /// Digest of `data`, already encoded for use as a header value.
    fn digest(&self, data: &[u8]) -> String;
}

/// MD5 over the chunk, base64 of the raw 16 digest bytes (`Content-MD5`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Base64;

impl ChunkDigestEngine for Md5Base64 {
    fn digest(&self, data: &[u8]) -> String {
        content_md5(data)
    }
}

/// Returns the `Content-MD5` header value for `data`.
pub fn content_md5(data: &[u8]) -> String {
    let digest = md5::compute(data);
    STANDARD.encode(digest.0)
}
