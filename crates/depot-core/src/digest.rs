//! Streaming SHA-1 helpers.
//!
//! Blob keys are computed incrementally while data is copied to disk or to a
//! socket, never by buffering a whole payload. Producers hash while writing;
//! verifiers (a server receiving a put, a proxy receiving a fetch) hash while
//! reading and compare against the expected key afterwards.

pub use sha1::{Digest, Sha1};

use crate::BlobKey;

/// Returns a fresh streaming hasher for blob key computation.
pub fn hasher() -> Sha1 {
    Sha1::new()
}

/// Consumes a hasher and returns the resulting blob key.
pub fn finalize_key(md: Sha1) -> BlobKey {
    let bytes: [u8; crate::BLOB_KEY_SIZE] = md.finalize().into();
    BlobKey::from(bytes)
}

/// Computes the key of an in-memory payload. Test and tooling convenience;
/// transfer paths hash incrementally instead.
pub fn key_of(data: &[u8]) -> BlobKey {
    let mut md = hasher();
    md.update(data);
    finalize_key(md)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_key() {
        assert_eq!(
            key_of(&[]).to_string(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_small_payload_key() {
        assert_eq!(
            key_of(&[0x01, 0x02, 0x03]).to_string(),
            "7037807198c22a7d2b0807371d763779a84fdfcf"
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = b"incremental hashing must match one-shot hashing";

        let mut md = hasher();
        for chunk in data.chunks(7) {
            md.update(chunk);
        }

        assert_eq!(finalize_key(md), key_of(data));
    }

    #[test]
    fn test_key_feeds_back_into_digest() {
        let key = key_of(b"payload");

        let mut direct = hasher();
        direct.update(key.as_bytes());

        let mut via_key = hasher();
        key.update_digest(&mut via_key);

        assert_eq!(finalize_key(direct), finalize_key(via_key));
    }
}
