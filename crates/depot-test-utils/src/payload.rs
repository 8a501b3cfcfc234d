//! Deterministic and random test payloads.

use depot_core::digest::key_of;
use depot_core::BlobKey;
use rand::RngCore;

/// A payload of `len` bytes beginning `1, 2, 3` and padded with zeroes.
///
/// Deterministic across runs, so its key can be precomputed or compared
/// between the two ends of a transfer.
pub fn patterned(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    for (i, b) in data.iter_mut().take(3).enumerate() {
        *b = (i + 1) as u8;
    }
    data
}

/// A payload of `len` random bytes.
pub fn random(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

/// A payload together with its precomputed key.
pub fn patterned_with_key(len: usize) -> (Vec<u8>, BlobKey) {
    let data = patterned(len);
    let key = key_of(&data);
    (data, key)
}
