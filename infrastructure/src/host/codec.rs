//! `Content-Length` framing
//!
//! Every message in either direction is `Content-Length: N\r\n\r\n` followed by
//! exactly `N` bytes of JSON. Unknown header lines are ignored.

use super::error::FrameError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted from the host.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Read one frame body. Returns `Ok(None)` on a clean end of stream between frames.
pub async fn read_frame<R>(reader: &mut R, line: &mut String) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;

    loop {
        line.clear();
        if reader.read_line(line).await? == 0 {
            return match content_length {
                None => Ok(None),
                Some(_) => Err(FrameError::Truncated),
            };
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            // blank line ends the header block, but only once a length was seen
            if content_length.is_some() {
                break;
            }
            continue;
        }

        if let Some(len_str) = trimmed.strip_prefix("Content-Length:")
            && let Ok(len) = len_str.trim().parse::<usize>()
        {
            content_length = Some(len);
        }
    }

    let len = content_length.unwrap_or_default();
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(e)
        }
    })?;
    Ok(Some(body))
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let mut buf = Vec::new();
        write_frame(&mut buf, br#"{"id":1}"#).await.unwrap();
        write_frame(&mut buf, br#"{"id":2}"#).await.unwrap();

        let mut reader = BufReader::new(buf.as_slice());
        let mut line = String::new();
        assert_eq!(
            read_frame(&mut reader, &mut line).await.unwrap().unwrap(),
            br#"{"id":1}"#
        );
        assert_eq!(
            read_frame(&mut reader, &mut line).await.unwrap().unwrap(),
            br#"{"id":2}"#
        );
        assert!(read_frame(&mut reader, &mut line).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ignores_extra_headers() {
        let raw = b"Content-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        let mut line = String::new();
        let body = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let raw = b"Content-Length: 10\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        let mut line = String::new();
        assert!(matches!(
            read_frame(&mut reader, &mut line).await,
            Err(FrameError::Truncated)
        ));
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let raw = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_LEN + 1);
        let mut reader = BufReader::new(raw.as_bytes());
        let mut line = String::new();
        assert!(matches!(
            read_frame(&mut reader, &mut line).await,
            Err(FrameError::TooLarge(_))
        ));
    }
}
