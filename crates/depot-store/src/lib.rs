//! On-disk content-addressed file store for the DEPOT artifact cache.
//!
//! Every role keeps its blobs in a per-process storage directory. A blob is
//! published in two steps: its bytes are streamed into a temp file, and the
//! finished temp file is renamed to `blob_<hex(key)>`. The rename is the
//! atomic publication point, so readers only ever observe complete blobs,
//! and concurrent writers of the same content converge on one file.

pub mod config;

mod error;
mod store;

pub use config::StorageConfig;
pub use error::{Error, Result};
pub use store::{FileStore, TempFile};

/// Filename prefix of published blobs.
pub const BLOB_FILE_PREFIX: &str = "blob_";

/// Filename prefix of in-flight temp files.
pub const TEMP_FILE_PREFIX: &str = "tmp-";
