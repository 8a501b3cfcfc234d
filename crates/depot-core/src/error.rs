//! Error types for core operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A blob key was constructed from a slice of the wrong length.
    #[error("blob key must be {expected} bytes, got {got}")]
    InvalidKeySize { expected: usize, got: usize },

    /// A job id was constructed from a slice of the wrong length.
    #[error("job id must be {expected} bytes, got {got}")]
    InvalidJobIdSize { expected: usize, got: usize },

    /// A hex string could not be parsed into a key or id.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}
