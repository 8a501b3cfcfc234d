//! Error types for wire protocol operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The peer closed the stream in the middle of a frame.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// The peer sent bytes that violate the framing rules.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Socket-level I/O failure.
    #[error("io: {0}")]
    Io(std::io::Error),
}

/// Result type for wire protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        // read_exact signals a short stream through the error kind; fold it
        // into the protocol-level EOF variant so callers match on one thing.
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}
