//! Core types for the DEPOT artifact cache.
//!
//! DEPOT ships build artifacts (jars, deployment descriptors, auxiliary
//! data) from a central node to workers. Every artifact is an opaque byte
//! sequence addressed by the SHA-1 digest of its contents, so a key is
//! simultaneously the artifact's identity and its integrity check.
//!
//! This crate holds the types shared by every other DEPOT crate: the
//! content-addressed [`BlobKey`], the [`JobId`] carried for provenance, and
//! the streaming [`digest`] helpers used on both ends of a transfer.

pub mod digest;
pub mod job;
pub mod key;

mod error;
mod hex;

pub use error::Error;
pub use job::{JobId, JOB_ID_SIZE};
pub use key::{BlobKey, BLOB_KEY_SIZE};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
