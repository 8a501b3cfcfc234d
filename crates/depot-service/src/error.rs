//! Error types for service operations.

use depot_core::BlobKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A facade operation was called before `init_server`/`init_proxy`.
    #[error("blob service has not been initialized")]
    NotInitialized,

    /// The requested blob does not exist, locally or (for a proxy) on the
    /// server.
    #[error("blob not found: {0}")]
    NotFound(BlobKey),

    /// The digest computed after a transfer does not match the expected key.
    #[error("data corruption detected during transfer: expected {expected}, got {actual}")]
    CorruptTransfer { expected: BlobKey, actual: BlobKey },

    /// Wire protocol failure.
    #[error(transparent)]
    Proto(#[from] depot_proto::Error),

    /// File store failure.
    #[error(transparent)]
    Store(#[from] depot_store::Error),

    /// Socket or filesystem failure outside the store.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, Error>;
