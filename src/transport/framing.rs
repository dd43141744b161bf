//! Length-prefixed bincode frames: a 4-byte big-endian length, then the body.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted frame body (1 MiB).
pub const MAX_FRAME_SIZE: u32 = 1 << 20;

fn io_error(e: std::io::Error, op: &str) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe => {
            anyhow::anyhow!("Connection reset by peer")
        }
        _ => anyhow::anyhow!("{} error: {}", op, e),
    }
}

/// Serializes `msg` and writes it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T, max_size: u32) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
    if data.len() > max_size as usize {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            data.len(),
            max_size
        ));
    }
    let len = (data.len() as u32).to_be_bytes();
    writer.write_all(&len).await.map_err(|e| io_error(e, "Write"))?;
    writer.write_all(&data).await.map_err(|e| io_error(e, "Write"))?;
    writer.flush().await.map_err(|e| io_error(e, "Write"))?;
    Ok(())
}

/// Reads one frame and deserializes it. Empty and oversized frames are
/// rejected before any body is read.
pub async fn read_frame<R, T>(reader: &mut R, max_size: u32) -> anyhow::Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| io_error(e, "Read"))?;
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid message length: 0"));
    }
    if len > max_size {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            max_size
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| io_error(e, "Read"))?;
    bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}
