//! Low-level POP3 stream handling.

use std::fmt;
use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::command::Command;
use crate::error::{Error, Result};

/// Any bidirectional byte stream a session can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// Type-erased transport, plain or TLS.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Runs `fut`, failing with [`Error::Timeout`] after `limit`.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = io::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => Err(Error::Timeout(limit)),
    }
}

/// Line-oriented POP3 stream.
pub struct Pop3Stream {
    reader: BufReader<BoxedStream>,
    io_timeout: Duration,
}

impl Pop3Stream {
    /// Wraps a connected transport.
    #[must_use]
    pub fn new(stream: BoxedStream, io_timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(stream),
            io_timeout,
        }
    }

    /// Returns the transport, e.g. for a TLS upgrade.
    ///
    /// Buffered unread input is discarded.
    #[must_use]
    pub fn into_inner(self) -> BoxedStream {
        self.reader.into_inner()
    }

    /// Reads one line without its line ending.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, times out, or the stream ends.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let n = with_timeout(self.io_timeout, self.reader.read_until(b'\n', &mut buf)).await?;
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of stream reached while trying to read line",
            )));
        }

        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        tracing::trace!("<<< {line}");
        Ok(line)
    }

    /// Writes a command.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or times out.
    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        tracing::debug!(">>> {command}");
        let data = command.serialize();
        let stream = self.reader.get_mut();
        with_timeout(self.io_timeout, async {
            stream.write_all(&data).await?;
            stream.flush().await
        })
        .await
    }

    /// Sends `command` (if any) and reads the status line.
    ///
    /// With `None`, only reads a line, which is how the greeting is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the line is empty or does not start with
    /// `+`, or a transport error.
    pub async fn execute(&mut self, command: Option<&Command>) -> Result<String> {
        if let Some(command) = command {
            self.write_command(command).await?;
        }

        let line = self.read_line().await?;
        if !line.starts_with('+') {
            return Err(Error::Server(line));
        }
        Ok(line)
    }

    /// Reads the lines of a multi-line response up to the lone `.`.
    ///
    /// Lines are returned as sent, without unstuffing; listings never start
    /// with a dot.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails or ends before the terminator.
    pub async fn read_listing(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "." {
                return Ok(lines);
            }
            lines.push(line);
        }
    }

    /// Reads a dot-stuffed message body up to the lone `.`.
    ///
    /// A leading `.` on a content line is removed. Line endings are kept as
    /// received.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails or ends before the terminator.
    pub async fn read_body(&mut self) -> Result<Bytes> {
        let mut body = BytesMut::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = with_timeout(self.io_timeout, self.reader.read_until(b'\n', &mut line)).await?;
            if n == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "end of stream reached inside message body",
                )));
            }

            let content = trim_line_ending(&line);
            if content == b"." {
                tracing::trace!(bytes = body.len(), "<<< message body");
                return Ok(body.freeze());
            }

            let unstuffed = line.strip_prefix(b".").unwrap_or(&line);
            body.put_slice(unstuffed);
        }
    }

    /// Shuts down the write half of the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails or times out.
    pub async fn shutdown(&mut self) -> Result<()> {
        let stream = self.reader.get_mut();
        with_timeout(self.io_timeout, stream.shutdown()).await
    }
}

impl fmt::Debug for Pop3Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pop3Stream")
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect
)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn stream(mock: tokio_test::io::Mock) -> Pop3Stream {
        Pop3Stream::new(Box::new(mock), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mock = Builder::new()
            .write(b"STAT\r\n")
            .read(b"+OK 2 320\r\n")
            .build();
        let mut stream = stream(mock);

        let line = stream.execute(Some(&Command::Stat)).await.unwrap();
        assert_eq!(line, "+OK 2 320");
    }

    #[tokio::test]
    async fn test_execute_error_response() {
        let mock = Builder::new()
            .write(b"RETR 9\r\n")
            .read(b"-ERR no such message\r\n")
            .build();
        let mut stream = stream(mock);

        let err = stream.execute(Some(&Command::Retr(9))).await.unwrap_err();
        assert!(matches!(err, Error::Server(ref msg) if msg == "-ERR no such message"));
    }

    #[tokio::test]
    async fn test_empty_line_is_error_response() {
        let mock = Builder::new().read(b"\r\n").build();
        let mut stream = stream(mock);

        let err = stream.execute(None).await.unwrap_err();
        assert!(matches!(err, Error::Server(ref msg) if msg.is_empty()));
    }

    #[tokio::test]
    async fn test_read_line_eof() {
        let mock = Builder::new().build();
        let mut stream = stream(mock);

        let err = stream.read_line().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_read_listing() {
        let mock = Builder::new()
            .read(b"1 abc\r\n2 def\r\n")
            .read(b".\r\n")
            .build();
        let mut stream = stream(mock);

        let lines = stream.read_listing().await.unwrap();
        assert_eq!(lines, vec!["1 abc".to_string(), "2 def".to_string()]);
    }

    #[tokio::test]
    async fn test_read_body_unstuffs_dots() {
        let mock = Builder::new()
            .read(b"Subject: dots\r\n\r\n..leading dot\r\n")
            .read(b"plain\r\n.\r\n")
            .build();
        let mut stream = stream(mock);

        let body = stream.read_body().await.unwrap();
        assert_eq!(body.as_ref(), b"Subject: dots\r\n\r\n.leading dot\r\nplain\r\n");
    }

    #[tokio::test]
    async fn test_read_body_truncated() {
        let mock = Builder::new().read(b"Subject: x\r\n").build();
        let mut stream = stream(mock);

        assert!(stream.read_body().await.unwrap_err().is_transport());
    }
}
