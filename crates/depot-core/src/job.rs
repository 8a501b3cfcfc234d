//! Job identifiers.
//!
//! The runtime assigns every submitted job a fixed-width random id. The
//! cache carries the id alongside put operations for provenance; it does not
//! index blobs by it.

use rand::RngCore;

use crate::{hex, Error};

/// Size of a job id in bytes.
pub const JOB_ID_SIZE: usize = 16;

/// A 16-byte job identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId([u8; JOB_ID_SIZE]);

impl JobId {
    /// Generates a fresh random id.
    pub fn random() -> Self {
        let mut bytes = [0u8; JOB_ID_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Constructs an id from a byte slice.
    ///
    /// Fails unless the slice is exactly [`JOB_ID_SIZE`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; JOB_ID_SIZE] =
            bytes.try_into().map_err(|_| Error::InvalidJobIdSize {
                expected: JOB_ID_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self(bytes))
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; JOB_ID_SIZE] {
        &self.0
    }
}

impl From<[u8; JOB_ID_SIZE]> for JobId {
    fn from(bytes: [u8; JOB_ID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        hex::encode(&self.0, f)
    }
}

impl std::fmt::Debug for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JobId({})", self)
    }
}

impl std::str::FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let mut bytes = [0u8; JOB_ID_SIZE];
        hex::decode(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}
