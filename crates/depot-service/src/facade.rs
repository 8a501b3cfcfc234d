//! Process-wide facade over the active role.
//!
//! A process runs at most one role at a time. The facade holds it in a
//! single guarded cell: the first successful `init_server`/`init_proxy`
//! wins, later attempts are ignored, and `shutdown` clears the cell so the
//! process can be re-initialized. Operations dispatch to whichever role is
//! active and fail with `NotInitialized` when none is.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use depot_core::{BlobKey, JobId};
use depot_store::StorageConfig;
use tokio::io::AsyncRead;
use tracing::warn;
use url::Url;

use crate::{Error, ProxyRole, Result, ServerRole};

enum Role {
    Server(ServerRole),
    Proxy(ProxyRole),
}

static ACTIVE_ROLE: RwLock<Option<Arc<Role>>> = RwLock::new(None);

fn active() -> Option<Arc<Role>> {
    ACTIVE_ROLE.read().expect("role cell poisoned").clone()
}

/// Installs a role into the empty cell. Returns `None` (after dropping the
/// candidate) when another initializer won the race.
fn install(candidate: Role) -> Option<Arc<Role>> {
    let mut cell = ACTIVE_ROLE.write().expect("role cell poisoned");
    if cell.is_some() {
        return None;
    }
    let role = Arc::new(candidate);
    *cell = Some(role.clone());
    Some(role)
}

/// Initializes the process as a blob server bound to `addr`.
///
/// If the service is already initialized the call is a no-op: the first
/// initialization wins and the freshly bound listener is dropped (which
/// closes it).
pub async fn init_server(addr: SocketAddr, config: &StorageConfig) -> Result<()> {
    if active().is_some() {
        warn!("blob service already initialized, ignoring init_server");
        return Ok(());
    }

    let server = ServerRole::bind(addr, config).await?;
    match install(Role::Server(server)) {
        Some(role) => {
            if let Role::Server(server) = role.as_ref() {
                server.start();
            }
        }
        None => warn!("lost blob service initialization race, discarding fresh server"),
    }
    Ok(())
}

/// Initializes the process as a blob proxy of the server at `server_addr`.
///
/// If the service is already initialized the call is a no-op; the first
/// initialization wins.
pub async fn init_proxy(server_addr: SocketAddr, config: &StorageConfig) -> Result<()> {
    if active().is_some() {
        warn!("blob service already initialized, ignoring init_proxy");
        return Ok(());
    }

    let proxy = ProxyRole::new(server_addr, config).await?;
    if install(Role::Proxy(proxy)).is_none() {
        warn!("lost blob service initialization race, discarding fresh proxy");
    }
    Ok(())
}

/// Stores `data` through the active role and returns its key.
pub async fn put_bytes(job_id: Option<&JobId>, data: &[u8]) -> Result<BlobKey> {
    match active().ok_or(Error::NotInitialized)?.as_ref() {
        Role::Server(server) => server.put_bytes(job_id, data).await,
        Role::Proxy(proxy) => proxy.put_bytes(job_id, data).await,
    }
}

/// Streams `reader` through the active role and returns the blob key.
pub async fn put_stream<R: AsyncRead + Unpin>(
    job_id: Option<&JobId>,
    reader: R,
) -> Result<BlobKey> {
    match active().ok_or(Error::NotInitialized)?.as_ref() {
        Role::Server(server) => server.put_stream(job_id, reader).await,
        Role::Proxy(proxy) => proxy.put_stream(job_id, reader).await,
    }
}

/// Opens the blob with the given key for reading through the active role.
pub async fn get(key: &BlobKey) -> Result<tokio::fs::File> {
    match active().ok_or(Error::NotInitialized)?.as_ref() {
        Role::Server(server) => server.get(key).await,
        Role::Proxy(proxy) => proxy.get(key).await,
    }
}

/// Returns a `file:` URL for the blob with the given key through the active
/// role.
pub async fn get_url(key: &BlobKey) -> Result<Url> {
    match active().ok_or(Error::NotInitialized)?.as_ref() {
        Role::Server(server) => server.get_url(key).await,
        Role::Proxy(proxy) => proxy.get_url(key).await,
    }
}

/// Shuts down the active role, if any, and empties the cell.
pub async fn shutdown() {
    let role = ACTIVE_ROLE.write().expect("role cell poisoned").take();
    if let Some(role) = role {
        match role.as_ref() {
            Role::Server(server) => server.shutdown().await,
            Role::Proxy(proxy) => proxy.shutdown().await,
        }
    }
}
