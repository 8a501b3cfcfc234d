//! Wire protocol for the DEPOT artifact cache.
//!
//! The protocol is a minimal binary framing layer over TCP. A connection
//! carries exactly one operation, announced by a single op byte:
//!
//! - **Put**: op byte, an optional job-id frame, then the payload as
//!   length-prefixed chunks (4-byte little-endian signed length followed by
//!   that many bytes; a negative length terminates the stream). The server
//!   answers with the 20-byte key it computed, then closes.
//! - **Get**: op byte plus the 20-byte requested key. The server answers
//!   with one status byte; on a hit the payload follows unframed until the
//!   server closes the connection.
//!
//! Puts are chunk-framed so both peers can drain a large upload cleanly
//! without tearing down the connection to signal its end; gets are a straight
//! copy of an already-committed file, so the TCP close is the terminator.

mod error;
mod frame;

pub use error::{Error, Result};
pub use frame::{
    read_job_id, read_length, read_op, read_status, recv_chunked, send_chunked, write_job_id,
    write_length, write_op, write_status, Op, Status,
};

/// Maximum size of a data chunk during network transfers, in bytes.
pub const TRANSFER_BUFFER_SIZE: usize = 4096;

/// Op byte announcing a put operation.
pub const PUT_OPERATION: u8 = 0x00;

/// Op byte announcing a get operation.
pub const GET_OPERATION: u8 = 0x01;

/// Get-response status byte: blob not found, end of stream follows.
pub const STATUS_MISS: u8 = 0x00;

/// Get-response status byte: payload follows until end of stream.
pub const STATUS_HIT: u8 = 0x01;
