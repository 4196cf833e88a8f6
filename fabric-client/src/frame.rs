//! Frame I/O for the one-request-per-connection protocols.
//!
//! A frame ends at the first `\n` or at EOF, whichever comes first, and may
//! never exceed [`MAX_FRAME_BYTES`]. Oversized input is an explicit error,
//! not a silent truncation.

use shared::protocol::{trim_padding, MAX_FRAME_BYTES};
use shared::FabricError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one frame and return its trimmed text.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, FabricError> {
    let mut buf = Vec::with_capacity(256);
    let mut chunk = [0u8; 256];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_FRAME_BYTES {
            return Err(FabricError::FrameTooLarge {
                max: MAX_FRAME_BYTES,
            });
        }
        if let Some(end) = buf.iter().position(|&b| b == b'\n') {
            buf.truncate(end);
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    Ok(trim_padding(&text).to_string())
}

/// Write one frame with its terminator and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    text: &str,
) -> Result<(), FabricError> {
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        write_frame(&mut client, "recordAddress=auth").await.unwrap();
        let text = read_frame(&mut server).await.unwrap();
        assert_eq!(text, "recordAddress=auth");
    }

    #[tokio::test]
    async fn reads_an_unterminated_frame_to_eof() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(b"getAddress=auth").await.unwrap();
        drop(client);
        let text = read_frame(&mut server).await.unwrap();
        assert_eq!(text, "getAddress=auth");
    }

    #[tokio::test]
    async fn trims_nul_padded_fixed_buffers() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let mut padded = [0u8; 64];
        padded[..15].copy_from_slice(b"getAddress=auth");
        client.write_all(&padded).await.unwrap();
        drop(client);
        let text = read_frame(&mut server).await.unwrap();
        assert_eq!(text, "getAddress=auth");
    }

    #[tokio::test]
    async fn rejects_an_oversized_frame() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let _ = client.write_all(&[b'x'; MAX_FRAME_BYTES + 1]).await;
        });
        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, FabricError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn stops_at_the_first_terminator() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(b"first\nsecond\n").await.unwrap();
        drop(client);
        let text = read_frame(&mut server).await.unwrap();
        assert_eq!(text, "first");
    }
}
