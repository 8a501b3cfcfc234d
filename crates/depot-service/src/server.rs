//! The authoritative server role.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use depot_core::digest::{finalize_key, hasher};
use depot_core::{BlobKey, JobId};
use depot_proto::{self as proto, Op, Status, TRANSFER_BUFFER_SIZE};
use depot_store::{FileStore, StorageConfig};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

use crate::spool::spool;
use crate::{Error, Result};

/// The server role: authoritative blob store plus its TCP endpoint.
///
/// [`ServerRole::bind`] opens the storage directory and binds the listener;
/// [`ServerRole::start`] begins accepting. Each accepted connection is
/// served on its own task, independent of the accept loop and of local
/// callers.
pub struct ServerRole {
    store: Arc<FileStore>,
    local_addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    shutting_down: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ServerRole {
    /// Opens the storage directory and binds the TCP listener.
    ///
    /// The listener does not accept connections until [`start`] is called;
    /// dropping an unstarted role closes it.
    ///
    /// [`start`]: ServerRole::start
    pub async fn bind(addr: SocketAddr, config: &StorageConfig) -> Result<Self> {
        let store = Arc::new(FileStore::open(config).await?);
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            store,
            local_addr,
            listener: Mutex::new(Some(listener)),
            shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            accept_task: Mutex::new(None),
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the accept loop. Calling this more than once has no effect.
    pub fn start(&self) {
        let Some(listener) = self.listener.lock().expect("listener cell poisoned").take() else {
            return;
        };

        let task = tokio::spawn(accept_loop(
            listener,
            self.store.clone(),
            self.shutting_down.clone(),
            self.shutdown_tx.subscribe(),
        ));
        *self.accept_task.lock().expect("accept task cell poisoned") = Some(task);

        info!(addr = %self.local_addr, "blob server accepting connections");
    }

    /// Stores `data` and returns its key. Local operation, no socket.
    pub async fn put_bytes(&self, job_id: Option<&JobId>, data: &[u8]) -> Result<BlobKey> {
        self.put_stream(job_id, data).await
    }

    /// Streams `reader` into the store and returns the computed key.
    ///
    /// The job id is accepted for provenance only; blobs are stored purely
    /// by content.
    pub async fn put_stream<R: AsyncRead + Unpin>(
        &self,
        _job_id: Option<&JobId>,
        mut reader: R,
    ) -> Result<BlobKey> {
        spool(&self.store, &mut reader, None).await
    }

    /// Opens the blob with the given key for reading.
    pub async fn get(&self, key: &BlobKey) -> Result<tokio::fs::File> {
        self.store
            .open_blob(key)
            .await?
            .ok_or(Error::NotFound(*key))
    }

    /// Returns a `file:` URL for the blob with the given key.
    pub async fn get_url(&self, key: &BlobKey) -> Result<Url> {
        self.store.url_for(key).await.ok_or(Error::NotFound(*key))
    }

    /// Stops accepting, joins the accept loop and wipes the storage
    /// directory.
    ///
    /// In-flight connection handlers are not joined; every client-visible
    /// acknowledgement is preceded by the corresponding disk commit, so
    /// tearing their sockets down with the process is safe.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let task = self.accept_task.lock().expect("accept task cell poisoned").take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!(error = %e, "accept task ended abnormally");
            }
        }

        self.store.wipe().await;
        info!("blob server shut down");
    }
}

async fn accept_loop(
    listener: TcpListener,
    store: Arc<FileStore>,
    shutting_down: Arc<AtomicBool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            result = listener.accept() => match result {
                Ok((socket, peer)) => {
                    debug!(%peer, "accepted blob connection");
                    tokio::spawn(handle_connection(store.clone(), socket, peer));
                }
                Err(e) => {
                    if shutting_down.load(Ordering::SeqCst) {
                        break;
                    }
                    error!(error = %e, "failed to accept blob connection");
                }
            }
        }
    }

    debug!("accept loop stopped");
}

/// Serves one connection; errors are logged here and never reach the accept
/// loop. The socket closes when the task returns.
async fn handle_connection(store: Arc<FileStore>, mut socket: TcpStream, peer: SocketAddr) {
    if let Err(e) = serve_connection(&store, &mut socket).await {
        error!(%peer, error = %e, "blob connection failed");
    }
}

async fn serve_connection(store: &FileStore, socket: &mut TcpStream) -> Result<()> {
    let op = match proto::read_op(socket).await {
        Ok(op) => op,
        // Peer connected and went away without sending an op.
        Err(proto::Error::UnexpectedEof) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    match op {
        Op::Put => serve_put(store, socket).await,
        Op::Get => serve_get(store, socket).await,
    }
}

/// Network put: drain the chunked payload into a temp file while hashing,
/// publish, then send the computed key back as the trailer.
async fn serve_put(store: &FileStore, socket: &mut TcpStream) -> Result<()> {
    let job_id = proto::read_job_id(socket).await?;
    if let Some(job_id) = &job_id {
        debug!(%job_id, "put tagged with job id");
    }

    let mut temp = store.alloc_temp().await?;
    let mut md = hasher();
    let received = proto::recv_chunked(socket, temp.writer(), &mut md).await?;

    let key = finalize_key(md);
    store.promote(temp, &key).await?;
    debug!(%key, bytes = received, "stored blob from network");

    key.write_to(socket).await?;
    socket.flush().await?;
    Ok(())
}

/// Network get: answer with the status byte, then stream the file until EOF
/// on a hit.
async fn serve_get(store: &FileStore, socket: &mut TcpStream) -> Result<()> {
    let key = BlobKey::read_from(socket).await.map_err(proto::Error::from)?;

    let Some(mut file) = store.open_blob(&key).await? else {
        debug!(%key, "blob requested but not found");
        proto::write_status(socket, Status::Miss).await?;
        socket.flush().await?;
        return Ok(());
    };

    proto::write_status(socket, Status::Hit).await?;

    let mut buf = [0u8; TRANSFER_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        socket.write_all(&buf[..read]).await?;
    }
    socket.flush().await?;
    Ok(())
}
