// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing
//!
//! Wire format: `[u32 BE length][JSON payload]`. The length counts the payload
//! bytes only, not the 4-byte header.

use serde::{de::DeserializeOwned, Serialize};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Maximum frame payload: 16 MiB
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Serialize a message to a JSON payload (no length prefix)
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, TransportError> {
    let data = serde_json::to_vec(msg)?;
    if data.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: data.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(data)
}

/// Deserialize a JSON payload
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, TransportError> {
    Ok(serde_json::from_slice(data)?)
}

/// Write one frame: length prefix, then payload
pub async fn write_frame<W>(writer: &mut W, data: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if data.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: data.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame, returning its payload.
///
/// EOF before the header (or inside the payload) is reported as
/// [`TransportError::ConnectionClosed`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact_or_closed(reader, &mut len_buf).await?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    read_exact_or_closed(reader, &mut buf).await?;
    Ok(buf)
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if is_disconnect(&e) => Err(TransportError::ConnectionClosed),
        Err(e) => Err(TransportError::Io(e)),
    }
}

/// I/O errors that mean the peer went away
pub(crate) fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
