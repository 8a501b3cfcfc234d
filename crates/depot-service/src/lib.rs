//! Server and proxy roles of the DEPOT artifact cache.
//!
//! The cache runs in one of two roles. A **server** is the authoritative
//! store: it persists blobs in its storage directory and serves put and get
//! requests from local callers and from the network. A **proxy** is a
//! read-through cache colocated with workers: it answers gets from its own
//! disk, fetches missing blobs from the configured server (verifying the
//! digest on arrival), and forwards puts to the server unconditionally.
//!
//! Callers either hold a role directly ([`ServerRole`], [`ProxyRole`]) or go
//! through the process-wide [`facade`], which owns the active role for the
//! lifetime of the process. The stateless [`client`] functions drive the
//! wire protocol against a server from anywhere.

pub mod client;
pub mod facade;

mod error;
mod proxy;
mod server;
mod spool;

pub use client::RemoteBlob;
pub use error::{Error, Result};
pub use proxy::ProxyRole;
pub use server::ServerRole;

/// Default TCP port of the server role.
pub const DEFAULT_PORT: u16 = 6124;
