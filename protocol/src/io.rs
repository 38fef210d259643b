use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Error;
use crate::frame;

/// Reads one length-prefixed frame from `reader`. Returns `Ok(None)` on a
/// clean close at a frame boundary (no bytes, or EOF before a frame
/// completes) — both are ordinary connection termination, not errors.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<(u8, u8, Vec<u8>)>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut length_bytes = [0u8; 4];
    if let Err(err) = reader.read_exact(&mut length_bytes).await {
        return if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(err.into())
        };
    }

    let length = u32::from_be_bytes(length_bytes) as usize;
    if length > frame::MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge(length as u32));
    }

    let mut body = vec![0u8; length];
    if let Err(err) = reader.read_exact(&mut body).await {
        return if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(err.into())
        };
    }

    let (version, command, payload) = frame::split_header(&body)?;
    Ok(Some((version, command, payload)))
}

/// Writes one length-prefixed frame to `writer` and flushes it.
pub async fn write_frame<W>(writer: &mut W, version: u8, command: u8, body: &[u8]) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame::encode_frame(version, command, body)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}
