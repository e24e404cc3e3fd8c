//! Byte source abstraction for the tokenizer.
//!
//! The tokenizer reads from any [`BufRead`] implementation. The buffered
//! reader's internal buffer gives look-ahead without consuming, and
//! [`FixedLengthReader`] bounds a literal to exactly its announced length.

use std::io::{self, BufRead, Read};

/// Peek/consume helpers on top of a buffered reader.
pub trait ByteSource: BufRead {
    /// Returns the next byte without consuming it, or `None` at end of stream.
    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Consumes and returns the next byte, or `None` at end of stream.
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.consume(1);
        }
        Ok(byte)
    }
}

impl<R: BufRead + ?Sized> ByteSource for R {}

/// A reader limited to exactly `length` bytes of the inner source.
///
/// Reading past the limit yields end of stream. Hitting end of stream on
/// the inner source before the limit is an error, since the announced
/// length was not delivered.
#[derive(Debug)]
pub struct FixedLengthReader<R> {
    inner: R,
    length: u64,
    remaining: u64,
}

impl<R: Read> FixedLengthReader<R> {
    /// Wraps `inner`, allowing `length` bytes to be read.
    pub const fn new(inner: R, length: u64) -> Self {
        Self {
            inner,
            length,
            remaining: length,
        }
    }

    /// Returns the announced length of the stream.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Returns the number of bytes not yet read.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns true if no byte has been read yet.
    #[must_use]
    pub const fn is_untouched(&self) -> bool {
        self.remaining == self.length
    }

    /// Reads and discards everything that is left.
    ///
    /// # Errors
    ///
    /// Returns an error if the inner source fails or ends early.
    pub fn skip_remaining(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for FixedLengthReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("literal ended {} bytes early", self.remaining),
            ));
        }

        self.remaining -= n as u64;
        Ok(n)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut source: &[u8] = b"ab";

        assert_eq!(source.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(source.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(source.next_byte().unwrap(), Some(b'a'));
        assert_eq!(source.next_byte().unwrap(), Some(b'b'));
        assert_eq!(source.peek_byte().unwrap(), None);
        assert_eq!(source.next_byte().unwrap(), None);
    }

    #[test]
    fn test_fixed_length_stops_at_limit() {
        let mut source: &[u8] = b"hello world";
        let mut fixed = FixedLengthReader::new(&mut source, 5);

        let mut out = String::new();
        fixed.read_to_string(&mut out).unwrap();

        assert_eq!(out, "hello");
        assert_eq!(fixed.remaining(), 0);
        assert_eq!(source, b" world");
    }

    #[test]
    fn test_fixed_length_skip_remaining() {
        let mut source: &[u8] = b"0123456789rest";
        let mut fixed = FixedLengthReader::new(&mut source, 10);

        let mut head = [0u8; 3];
        fixed.read_exact(&mut head).unwrap();
        assert!(!fixed.is_untouched());

        assert_eq!(fixed.skip_remaining().unwrap(), 7);
        assert_eq!(source, b"rest");
    }

    #[test]
    fn test_fixed_length_short_source_is_error() {
        let mut source: &[u8] = b"abc";
        let mut fixed = FixedLengthReader::new(&mut source, 10);

        let mut out = Vec::new();
        let err = fixed.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
