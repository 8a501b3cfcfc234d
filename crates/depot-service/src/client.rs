//! Stateless client routines driving the wire protocol against a server.
//!
//! These functions work from any process that can reach the server's TCP
//! endpoint; neither role state nor a storage directory is required. The
//! proxy role builds its forwarding and read-through paths on top of them.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use depot_core::digest::{finalize_key, hasher};
use depot_core::{BlobKey, JobId};
use depot_proto::{self as proto, Op, Status};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::{Error, Result};

/// A blob being streamed from a remote server.
///
/// The handle owns the underlying socket: the payload runs until end of
/// stream, and dropping the handle closes the connection.
pub struct RemoteBlob {
    stream: TcpStream,
}

impl AsyncRead for RemoteBlob {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

/// Stores `data` on the server at `server_addr` and returns its key.
pub async fn put_bytes(
    job_id: Option<&JobId>,
    data: &[u8],
    server_addr: SocketAddr,
) -> Result<BlobKey> {
    put_stream(job_id, data, server_addr).await
}

/// Streams `reader` to the server at `server_addr` and returns the blob key.
///
/// The payload is hashed while it is chunked onto the wire. After the
/// terminator the server answers with the key it computed; a mismatch with
/// the locally computed key fails with `CorruptTransfer`, and any data after
/// the 20-byte trailer is a protocol violation. No retries are attempted.
pub async fn put_stream<R: AsyncRead + Unpin>(
    job_id: Option<&JobId>,
    mut reader: R,
    server_addr: SocketAddr,
) -> Result<BlobKey> {
    let mut stream = TcpStream::connect(server_addr).await?;

    proto::write_op(&mut stream, Op::Put).await?;
    proto::write_job_id(&mut stream, job_id).await?;

    let mut md = hasher();
    let sent = proto::send_chunked(&mut reader, &mut stream, &mut md).await?;
    let local_key = finalize_key(md);
    debug!(key = %local_key, bytes = sent, server = %server_addr, "uploaded blob");

    let remote_key = BlobKey::read_from(&mut stream)
        .await
        .map_err(proto::Error::from)?;

    // The server must close right after the trailer.
    let mut probe = [0u8; 1];
    if stream.read(&mut probe).await? != 0 {
        return Err(proto::Error::Protocol(
            "unexpected data after put trailer".to_string(),
        )
        .into());
    }

    if local_key != remote_key {
        return Err(Error::CorruptTransfer {
            expected: local_key,
            actual: remote_key,
        });
    }

    Ok(local_key)
}

/// Opens a get stream for `key` against the server at `server_addr`.
///
/// On a hit the returned [`RemoteBlob`] reads the payload off the still-open
/// socket. On a miss the socket is closed before `NotFound` is returned.
pub async fn get(key: &BlobKey, server_addr: SocketAddr) -> Result<RemoteBlob> {
    let mut stream = TcpStream::connect(server_addr).await?;

    proto::write_op(&mut stream, Op::Get).await?;
    key.write_to(&mut stream).await?;
    stream.flush().await?;

    match proto::read_status(&mut stream).await? {
        Status::Hit => Ok(RemoteBlob { stream }),
        Status::Miss => Err(Error::NotFound(*key)),
    }
}
