//! Line codec for the stdio wire protocol.
//!
//! One JSON-RPC message per line, UTF-8, terminated by `\n` (a preceding
//! `\r` is tolerated). Lines longer than the configured maximum are skipped
//! without being buffered whole.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line without its terminator.
    Message(String),
    /// The line exceeded `limit` bytes and was discarded.
    TooLarge { limit: usize },
}

/// Read one message line. Returns `None` on clean EOF.
///
/// Blank lines are skipped.
pub async fn read_message<R>(reader: &mut R, max_bytes: usize) -> std::io::Result<Option<Inbound>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut buf = Vec::new();
        // Room for the limit plus a CRLF terminator.
        let read = (&mut *reader)
            .take(max_bytes as u64 + 2)
            .read_until(b'\n', &mut buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > max_bytes {
            if !terminated {
                skip_line(reader).await?;
            }
            return Ok(Some(Inbound::TooLarge { limit: max_bytes }));
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        return Ok(Some(Inbound::Message(line)));
    }
}

/// Consume input up to and including the next newline.
async fn skip_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Write one message as a single line and flush.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn read_all(input: &[u8], max: usize) -> Vec<Inbound> {
        let mut reader = BufReader::new(input);
        let mut out = Vec::new();
        while let Some(msg) = read_message(&mut reader, max).await.unwrap() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let msgs = read_all(b"{\"a\":1}\r\n\n{\"b\":2}\n{\"c\":3}", 64).await;
        assert_eq!(
            msgs,
            vec![
                Inbound::Message("{\"a\":1}".to_string()),
                Inbound::Message("{\"b\":2}".to_string()),
                Inbound::Message("{\"c\":3}".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_line_skipped_and_stream_resyncs() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\nok\n");
        let msgs = read_all(&input, 10).await;
        assert_eq!(
            msgs,
            vec![
                Inbound::TooLarge { limit: 10 },
                Inbound::Message("ok".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_line_at_exact_limit_accepted() {
        let msgs = read_all(b"0123456789\n", 10).await;
        assert_eq!(msgs, vec![Inbound::Message("0123456789".to_string())]);
    }

    #[tokio::test]
    async fn test_write_message_appends_newline() {
        let mut out = Vec::new();
        write_message(&mut out, &serde_json::json!({"ok": true})).await.unwrap();
        assert_eq!(out, b"{\"ok\":true}\n");
    }
}
