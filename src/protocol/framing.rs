//! Newline-delimited JSON framing, with the ability to switch mid-stream to
//! reading/writing an exact number of raw bytes for upload/download payloads.
//!
//! The receiver side MUST read exactly `filesize` bytes through the *same*
//! buffered reader used for line parsing before resuming line parsing — no
//! additional delimiter follows the payload. See §6/§9 ("streaming binary
//! after JSON on the same socket").

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};

/// Reads one newline-terminated line and decodes it as JSON.
///
/// Returns `Ok(None)` on clean EOF (no more lines), matching how the central
/// session loop treats closure as the end of the connection (§7, transport
/// errors band).
pub async fn read_json_line<R, T>(reader: &mut R) -> std::io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let read = reader.read_line(&mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(trimmed)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

/// Reads one line as a raw string (used when the caller wants to distinguish
/// "not valid JSON" from "connection closed" itself, e.g. to reply
/// `INVALID_JSON` and keep the connection open).
///
/// A blank line (after stripping `\r\n`) is skipped rather than treated as
/// EOF — only a genuine 0-byte read ends the session.
pub async fn read_line_raw<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
        if trimmed.is_empty() {
            continue;
        }
        return Ok(Some(trimmed));
    }
}

/// Serializes `value` as a single JSON line terminated by `\n` and writes it.
pub async fn write_json_line<W, T>(writer: &mut W, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_string(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Reads exactly `len` bytes from the buffered reader backing the line
/// protocol. Short reads (connection dropped mid-payload) surface as an
/// `UnexpectedEof` error, which callers map to `UPLOAD_FAILED`.
pub async fn read_exact_payload<R>(reader: &mut R, len: u64) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Writes a raw byte payload with no framing around it.
pub async fn write_payload<W>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;
    use tokio::io::BufReader;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[tokio::test]
    async fn reads_one_line_then_exact_payload() {
        let mut data = b"{\"n\":1}\n".to_vec();
        data.extend_from_slice(b"HELLO");
        let mut reader = BufReader::new(Cursor::new(data));

        let ping: Option<Ping> = read_json_line(&mut reader).await.unwrap();
        assert_eq!(ping, Some(Ping { n: 1 }));

        let payload = read_exact_payload(&mut reader, 5).await.unwrap();
        assert_eq!(payload, b"HELLO");
    }

    #[tokio::test]
    async fn short_payload_is_unexpected_eof() {
        let mut reader = BufReader::new(Cursor::new(b"abc".to_vec()));
        let err = read_exact_payload(&mut reader, 10).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn eof_on_empty_stream_returns_none() {
        let mut reader = BufReader::new(Cursor::new(Vec::<u8>::new()));
        let line: Option<Ping> = read_json_line(&mut reader).await.unwrap();
        assert_eq!(line, None);
    }

    #[tokio::test]
    async fn read_line_raw_skips_blank_lines_without_closing() {
        let mut reader = BufReader::new(Cursor::new(b"\n\n{\"n\":1}\n".to_vec()));
        let line = read_line_raw(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("{\"n\":1}"));
    }

    #[tokio::test]
    async fn read_line_raw_only_closes_on_real_eof() {
        let mut reader = BufReader::new(Cursor::new(b"\n\n".to_vec()));
        let line: Option<String> = read_line_raw(&mut reader).await.unwrap();
        assert_eq!(line, None);
    }
}
