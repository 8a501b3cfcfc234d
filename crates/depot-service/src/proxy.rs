//! The read-through proxy role.

use std::net::SocketAddr;

use depot_core::{BlobKey, JobId};
use depot_store::{FileStore, StorageConfig};
use tokio::io::AsyncRead;
use tracing::{debug, info};
use url::Url;

use crate::spool::spool;
use crate::{client, Error, Result};

/// The proxy role: a local blob cache backed by a remote server.
///
/// Gets are answered from the local storage directory when possible; a miss
/// triggers a verified download from the server, after which the blob is
/// served locally. Puts are forwarded to the server unconditionally and
/// leave nothing in the local cache.
pub struct ProxyRole {
    server_addr: SocketAddr,
    store: FileStore,
}

impl ProxyRole {
    /// Opens the local storage directory for a proxy of the server at
    /// `server_addr`.
    pub async fn new(server_addr: SocketAddr, config: &StorageConfig) -> Result<Self> {
        let store = FileStore::open(config).await?;
        info!(server = %server_addr, "blob proxy ready");
        Ok(Self { server_addr, store })
    }

    /// The address of the backing server.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Forwards `data` to the server and returns the verified key.
    pub async fn put_bytes(&self, job_id: Option<&JobId>, data: &[u8]) -> Result<BlobKey> {
        client::put_bytes(job_id, data, self.server_addr).await
    }

    /// Forwards `reader` to the server and returns the verified key.
    pub async fn put_stream<R: AsyncRead + Unpin>(
        &self,
        job_id: Option<&JobId>,
        reader: R,
    ) -> Result<BlobKey> {
        client::put_stream(job_id, reader, self.server_addr).await
    }

    /// Opens the blob with the given key, downloading it first if it is not
    /// cached locally.
    pub async fn get(&self, key: &BlobKey) -> Result<tokio::fs::File> {
        if let Some(file) = self.store.open_blob(key).await? {
            return Ok(file);
        }

        self.fetch(key).await?;

        self.store
            .open_blob(key)
            .await?
            .ok_or(Error::NotFound(*key))
    }

    /// Returns a `file:` URL for the blob with the given key, downloading it
    /// first if it is not cached locally.
    pub async fn get_url(&self, key: &BlobKey) -> Result<Url> {
        if let Some(url) = self.store.url_for(key).await {
            return Ok(url);
        }

        self.fetch(key).await?;

        self.store.url_for(key).await.ok_or(Error::NotFound(*key))
    }

    /// Downloads the blob with the given key into the local cache.
    ///
    /// The payload is hashed while it is spooled to a temp file; the blob is
    /// only published if the digest matches the requested key, so a
    /// corrupted transfer never becomes servable. Concurrent fetches of the
    /// same key race benignly on the final rename.
    async fn fetch(&self, key: &BlobKey) -> Result<()> {
        debug!(%key, server = %self.server_addr, "fetching blob from server");

        let mut remote = client::get(key, self.server_addr).await?;
        spool(&self.store, &mut remote, Some(key)).await?;

        debug!(%key, "blob cached locally");
        Ok(())
    }

    /// Wipes the local cache directory.
    pub async fn shutdown(&self) {
        self.store.wipe().await;
        info!("blob proxy shut down");
    }
}
