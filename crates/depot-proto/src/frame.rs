//! Frame readers and writers.
//!
//! All helpers operate on plain `AsyncRead`/`AsyncWrite` streams so they can
//! run against sockets in production and in-memory duplexes in tests.

use depot_core::digest::{Digest, Sha1};
use depot_core::{JobId, JOB_ID_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    Error, Result, GET_OPERATION, PUT_OPERATION, STATUS_HIT, STATUS_MISS, TRANSFER_BUFFER_SIZE,
};

/// The operation announced by the first byte of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Get,
}

/// The first byte of a get response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Miss,
    Hit,
}

/// Reads the op byte from a fresh connection.
pub async fn read_op<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Op> {
    match reader.read_u8().await? {
        PUT_OPERATION => Ok(Op::Put),
        GET_OPERATION => Ok(Op::Get),
        other => Err(Error::Protocol(format!("unknown operation code {}", other))),
    }
}

/// Writes the op byte opening a connection.
pub async fn write_op<W: AsyncWrite + Unpin>(writer: &mut W, op: Op) -> Result<()> {
    let byte = match op {
        Op::Put => PUT_OPERATION,
        Op::Get => GET_OPERATION,
    };
    writer.write_u8(byte).await?;
    Ok(())
}

/// Reads the status byte of a get response.
pub async fn read_status<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Status> {
    match reader.read_u8().await? {
        STATUS_MISS => Ok(Status::Miss),
        STATUS_HIT => Ok(Status::Hit),
        other => Err(Error::Protocol(format!("unknown status byte {}", other))),
    }
}

/// Writes the status byte of a get response.
pub async fn write_status<W: AsyncWrite + Unpin>(writer: &mut W, status: Status) -> Result<()> {
    let byte = match status {
        Status::Miss => STATUS_MISS,
        Status::Hit => STATUS_HIT,
    };
    writer.write_u8(byte).await?;
    Ok(())
}

/// Reads a 4-byte little-endian signed chunk length.
pub async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).await?;
    Ok(i32::from_le_bytes(buf))
}

/// Writes a 4-byte little-endian signed chunk length.
pub async fn write_length<W: AsyncWrite + Unpin>(writer: &mut W, length: i32) -> Result<()> {
    writer.write_all(&length.to_le_bytes()).await?;
    Ok(())
}

/// Reads the optional job-id frame of a put request.
///
/// The frame is a flag byte: `0x00` for no id, `0x01` followed by exactly
/// [`JOB_ID_SIZE`] bytes. Any other flag value is a protocol violation.
pub async fn read_job_id<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<JobId>> {
    match reader.read_u8().await? {
        0x00 => Ok(None),
        0x01 => {
            let mut bytes = [0u8; JOB_ID_SIZE];
            reader.read_exact(&mut bytes).await?;
            Ok(Some(JobId::from(bytes)))
        }
        other => Err(Error::Protocol(format!(
            "malformed job id frame (flag byte {})",
            other
        ))),
    }
}

/// Writes the optional job-id frame of a put request.
pub async fn write_job_id<W: AsyncWrite + Unpin>(
    writer: &mut W,
    job_id: Option<&JobId>,
) -> Result<()> {
    match job_id {
        None => writer.write_u8(0x00).await?,
        Some(id) => {
            writer.write_u8(0x01).await?;
            writer.write_all(id.as_bytes()).await?;
        }
    }
    Ok(())
}

/// Streams a put payload: reads from `reader` until EOF, forwarding it to
/// `writer` as length-prefixed chunks of at most [`TRANSFER_BUFFER_SIZE`]
/// bytes while updating `md`, then writes the terminator and flushes.
///
/// Returns the number of payload bytes sent.
pub async fn send_chunked<R, W>(reader: &mut R, writer: &mut W, md: &mut Sha1) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }

        md.update(&buf[..read]);
        write_length(writer, read as i32).await?;
        writer.write_all(&buf[..read]).await?;
        total += read as u64;
    }

    write_length(writer, -1).await?;
    writer.flush().await?;

    Ok(total)
}

/// Receives a put payload: consumes length-prefixed chunks from `reader`
/// until the terminator, forwarding the bytes to `writer` while updating
/// `md`.
///
/// Chunks larger than [`TRANSFER_BUFFER_SIZE`] are rejected as a protocol
/// violation. Returns the number of payload bytes received.
pub async fn recv_chunked<R, W>(reader: &mut R, writer: &mut W, md: &mut Sha1) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; TRANSFER_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let length = read_length(reader).await?;
        if length < 0 {
            break;
        }

        let length = length as usize;
        if length > TRANSFER_BUFFER_SIZE {
            return Err(Error::Protocol(format!(
                "chunk of {} bytes exceeds the {} byte transfer limit",
                length, TRANSFER_BUFFER_SIZE
            )));
        }

        reader.read_exact(&mut buf[..length]).await?;
        md.update(&buf[..length]);
        writer.write_all(&buf[..length]).await?;
        total += length as u64;
    }

    Ok(total)
}
