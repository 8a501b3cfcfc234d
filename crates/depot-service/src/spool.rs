//! Shared spill-to-store transfer loop.

use depot_core::digest::{finalize_key, hasher, Digest};
use depot_core::BlobKey;
use depot_proto::TRANSFER_BUFFER_SIZE;
use depot_store::FileStore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::{Error, Result};

/// Streams `reader` to a fresh temp file while hashing, then publishes the
/// file under the computed key.
///
/// When `expected` is given, the computed digest is checked against it
/// before publication; a mismatch aborts with `CorruptTransfer` and nothing
/// is published. The temp file is deleted on every error path.
pub(crate) async fn spool<R: AsyncRead + Unpin>(
    store: &FileStore,
    reader: &mut R,
    expected: Option<&BlobKey>,
) -> Result<BlobKey> {
    let mut temp = store.alloc_temp().await?;
    let mut md = hasher();
    let mut buf = [0u8; TRANSFER_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        md.update(&buf[..read]);
        temp.writer().write_all(&buf[..read]).await?;
    }

    let key = finalize_key(md);
    if let Some(expected) = expected {
        if key != *expected {
            return Err(Error::CorruptTransfer {
                expected: *expected,
                actual: key,
            });
        }
    }

    store.promote(temp, &key).await?;
    Ok(key)
}
