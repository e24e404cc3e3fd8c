//! Streaming response tokenizer.
//!
//! [`ResponseParser`] reads one response at a time from a blocking
//! [`BufRead`] source. It peeks at the next byte and dispatches on it:
//!
//! - `*` starts an untagged response, `+` a continuation request, anything
//!   else is a tag running up to the first space.
//! - `(`/`)` and `[`/`]` delimit lists and sequences. A stray closing
//!   character at top level is dropped.
//! - `"` starts a quoted string; `\` escapes the next character.
//! - `{n}` CRLF announces a literal of `n` bytes, passed to a
//!   [`LiteralHandler`].
//! - Everything else is an atom.
//!
//! # Example
//!
//! ```
//! use mailfetch_imap::ResponseParser;
//!
//! let mut parser = ResponseParser::new(&b"* 1 FETCH (UID 5)\r\n"[..]);
//! let response = parser.read_response().unwrap();
//!
//! assert!(response.tag().is_none());
//! assert_eq!(response.get_string(1).unwrap(), "FETCH");
//! let items = response.get_list(2).unwrap();
//! assert_eq!(items.get_keyed_string("UID"), Some("5"));
//! ```

#![allow(clippy::missing_errors_doc)]

mod literal;
mod status;

pub use literal::{
    BoxError, BufferLiterals, DeferLiterals, LiteralAction, LiteralError, LiteralHandler,
};

use std::io::{self, BufRead, Read};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::source::{ByteSource, FixedLengthReader};
use crate::types::{Response, ResponseList, Token};

/// Outcome of reading one element.
enum Step {
    Token(Token),
    Close(u8),
    EndOfLine,
    Suspended,
}

/// Per-call parse state.
struct ParseContext<'h> {
    handler: &'h mut dyn LiteralHandler,
    errors: Vec<BoxError>,
}

/// Tokenizer over a buffered byte source.
///
/// One parser serves one connection. It may be reused for any number of
/// responses in sequence, but is not meant to be shared.
#[derive(Debug)]
pub struct ResponseParser<R> {
    reader: R,
    position: u64,
    pending_literal: u64,
    suspended: bool,
}

impl<R: BufRead> ResponseParser<R> {
    /// Creates a parser reading from `reader`.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            pending_literal: 0,
            suspended: false,
        }
    }

    /// Number of bytes consumed from the source so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns a reference to the underlying reader.
    pub const fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads the next response, buffering all literals in memory.
    pub fn read_response(&mut self) -> Result<Response> {
        self.read_response_with(&mut BufferLiterals)
    }

    /// Reads the next response, passing each literal to `handler`.
    ///
    /// If the previous response was suspended on a deferred literal and never
    /// resumed, its remainder is read and discarded first.
    ///
    /// A non-I/O handler failure does not stop parsing. The response is read
    /// to its end and then returned inside [`Error::LiteralHandler`].
    pub fn read_response_with(&mut self, handler: &mut dyn LiteralHandler) -> Result<Response> {
        if self.suspended {
            self.discard_suspended()?;
        }

        let mut response = Response::new();
        self.read_prefix(&mut response)?;

        let mut ctx = ParseContext {
            handler,
            errors: Vec::new(),
        };
        self.read_tokens(&mut response, &mut ctx)?;
        tracing::trace!(%response, completed = response.is_completed(), "<<<");

        match first_error(ctx.errors) {
            Some(source) => Err(Error::LiteralHandler {
                source,
                response: Box::new(response),
            }),
            None => Ok(response),
        }
    }

    /// Returns the deferred literal of a suspended response.
    ///
    /// Bytes read here are gone for good. Whatever is left when the reader is
    /// dropped is skipped by the next call to [`more`](Self::more).
    pub fn literal(&mut self) -> Option<LiteralReader<'_, R>> {
        if !self.suspended {
            return None;
        }
        let length = self.pending_literal;
        Some(LiteralReader {
            inner: FixedLengthReader::new(&mut self.reader, length),
            pending: &mut self.pending_literal,
            position: &mut self.position,
        })
    }

    /// Resumes a response suspended on a deferred literal.
    ///
    /// Returns true once the response is complete.
    pub fn more(&mut self, response: &mut Response) -> Result<bool> {
        self.more_with(response, &mut BufferLiterals)
    }

    /// Resumes a suspended response, passing further literals to `handler`.
    pub fn more_with(
        &mut self,
        response: &mut Response,
        handler: &mut dyn LiteralHandler,
    ) -> Result<bool> {
        if !self.suspended {
            return Ok(response.is_completed());
        }
        self.skip_pending_literal()?;
        self.suspended = false;

        let mut ctx = ParseContext {
            handler,
            errors: Vec::new(),
        };
        self.read_tokens(response, &mut ctx)?;

        match first_error(ctx.errors) {
            Some(source) => Err(Error::LiteralHandler {
                source,
                response: Box::new(response.clone()),
            }),
            None => Ok(response.is_completed()),
        }
    }

    fn discard_suspended(&mut self) -> Result<()> {
        tracing::debug!("discarding remainder of suspended response");
        let mut rest = Response::new();
        while !self.more(&mut rest)? {}
        Ok(())
    }

    fn skip_pending_literal(&mut self) -> Result<()> {
        if self.pending_literal > 0 {
            let mut fixed = FixedLengthReader::new(&mut self.reader, self.pending_literal);
            let skipped = fixed.skip_remaining()?;
            self.position += skipped;
            self.pending_literal = 0;
        }
        Ok(())
    }

    fn read_prefix(&mut self, response: &mut Response) -> Result<()> {
        match self.peek()? {
            None => Err(self.error("end of stream before response")),
            Some(b'*') => {
                self.advance();
                match self.next()? {
                    Some(b' ') => Ok(()),
                    _ => Err(self.error("expected space after '*'")),
                }
            }
            Some(b'+') => {
                self.advance();
                response.set_continuation_requested();
                Ok(())
            }
            Some(_) => {
                let tag = self.read_tag()?;
                response.set_tag(tag);
                Ok(())
            }
        }
    }

    fn read_tag(&mut self) -> Result<String> {
        let mut tag = Vec::new();
        loop {
            match self.peek()? {
                Some(b' ') => {
                    self.advance();
                    break;
                }
                Some(b'\r' | b'\n') => break,
                Some(b) => {
                    self.advance();
                    tag.push(b);
                }
                None => return Err(self.error("end of stream in tag")),
            }
        }
        if tag.is_empty() {
            return Err(self.error("empty tag"));
        }
        Ok(String::from_utf8_lossy(&tag).into_owned())
    }

    fn read_tokens(&mut self, response: &mut Response, ctx: &mut ParseContext<'_>) -> Result<()> {
        loop {
            match self.read_step(response, ctx, false)? {
                Step::Token(token) => response.push(token),
                Step::Close(c) => {
                    tracing::trace!(close = %char::from(c), "dropping stray closing character");
                }
                Step::EndOfLine => {
                    response.set_completed(true);
                    return Ok(());
                }
                Step::Suspended => {
                    self.suspended = true;
                    response.set_completed(false);
                    return Ok(());
                }
            }
        }
    }

    fn read_step(
        &mut self,
        response: &Response,
        ctx: &mut ParseContext<'_>,
        nested: bool,
    ) -> Result<Step> {
        loop {
            let Some(byte) = self.peek()? else {
                return Err(self.error("unexpected end of stream"));
            };

            match byte {
                b' ' | b'\t' => self.advance(),
                b'\r' => {
                    self.advance();
                    return match self.next()? {
                        Some(b'\n') => Ok(Step::EndOfLine),
                        _ => Err(self.error("expected LF after CR")),
                    };
                }
                b'\n' => {
                    self.advance();
                    return Ok(Step::EndOfLine);
                }
                b'(' => {
                    self.advance();
                    let list = self.read_list(b')', response, ctx)?;
                    return Ok(Step::Token(Token::List(list)));
                }
                b'[' => {
                    self.advance();
                    let list = self.read_list(b']', response, ctx)?;
                    return Ok(Step::Token(Token::Sequence(list)));
                }
                b')' | b']' => {
                    self.advance();
                    return Ok(Step::Close(byte));
                }
                b'"' => {
                    self.advance();
                    return self.read_quoted().map(Step::Token);
                }
                b'{' => {
                    self.advance();
                    return self.read_literal(response, ctx, nested);
                }
                _ => return self.read_atom().map(Step::Token),
            }
        }
    }

    fn read_list(
        &mut self,
        close: u8,
        response: &Response,
        ctx: &mut ParseContext<'_>,
    ) -> Result<ResponseList> {
        let mut list = ResponseList::new();
        loop {
            match self.read_step(response, ctx, true)? {
                Step::Token(token) => list.push(token),
                Step::Close(c) if c == close => return Ok(list),
                Step::Close(c) => {
                    return Err(self.error(&format!(
                        "unexpected '{}' while looking for '{}'",
                        char::from(c),
                        char::from(close)
                    )));
                }
                Step::EndOfLine | Step::Suspended => {
                    return Err(self.error(&format!(
                        "line ended before closing '{}'",
                        char::from(close)
                    )));
                }
            }
        }
    }

    fn read_quoted(&mut self) -> Result<Token> {
        let mut value = Vec::new();
        loop {
            match self.next()? {
                Some(b'"') => break,
                Some(b'\\') => match self.next()? {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("end of stream in quoted string")),
                },
                Some(b) => value.push(b),
                None => return Err(self.error("end of stream in quoted string")),
            }
        }
        Ok(Token::Quoted(String::from_utf8_lossy(&value).into_owned()))
    }

    fn read_atom(&mut self) -> Result<Token> {
        let mut value = Vec::new();
        while let Some(b) = self.peek()? {
            if is_atom_terminator(b) {
                break;
            }
            self.advance();
            value.push(b);
        }
        if value.is_empty() {
            return Err(self.error("empty atom"));
        }
        Ok(Token::Atom(String::from_utf8_lossy(&value).into_owned()))
    }

    fn read_literal_length(&mut self) -> Result<u64> {
        let mut digits = String::new();
        loop {
            match self.next()? {
                Some(b'}') => break,
                Some(b) if b.is_ascii_digit() => digits.push(char::from(b)),
                Some(b) => {
                    return Err(self.error(&format!(
                        "invalid character {:?} in literal length",
                        char::from(b)
                    )));
                }
                None => return Err(self.error("end of stream in literal length")),
            }
        }
        let length = digits
            .parse::<u64>()
            .map_err(|e| self.error(&format!("invalid literal length {digits:?}: {e}")))?;

        if self.peek()? == Some(b'\r') {
            self.advance();
        }
        match self.next()? {
            Some(b'\n') => Ok(length),
            _ => Err(self.error("expected line ending after literal length")),
        }
    }

    fn read_literal(
        &mut self,
        response: &Response,
        ctx: &mut ParseContext<'_>,
        nested: bool,
    ) -> Result<Step> {
        let length = self.read_literal_length()?;
        if length == 0 {
            return Ok(Step::Token(Token::Literal(Bytes::new())));
        }

        let mut fixed = FixedLengthReader::new(&mut self.reader, length);
        let outcome = ctx.handler.handle(response, &mut fixed);

        let step = match outcome {
            Err(LiteralError::Io(e)) => {
                self.position += length - fixed.remaining();
                return Err(Error::Io(e));
            }
            Err(LiteralError::Handler(e)) => {
                ctx.errors.push(e);
                fixed.skip_remaining()?;
                Step::Token(Token::Literal(Bytes::new()))
            }
            Ok(LiteralAction::Substitute(token)) => {
                fixed.skip_remaining()?;
                Step::Token(token)
            }
            Ok(LiteralAction::Defer) if !nested => {
                self.pending_literal = fixed.remaining();
                Step::Suspended
            }
            Ok(LiteralAction::Buffer | LiteralAction::Defer) => {
                if fixed.is_untouched() {
                    let mut data = Vec::with_capacity(capacity_hint(length));
                    fixed.read_to_end(&mut data)?;
                    Step::Token(Token::Literal(Bytes::from(data)))
                } else {
                    let consumed = length - fixed.remaining();
                    ctx.errors.push(
                        format!(
                            "literal handler read {consumed} of {length} bytes without returning a token"
                        )
                        .into(),
                    );
                    fixed.skip_remaining()?;
                    Step::Token(Token::Literal(Bytes::new()))
                }
            }
        };

        self.position += length - fixed.remaining();
        Ok(step)
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.peek_byte()?)
    }

    fn next(&mut self) -> Result<Option<u8>> {
        let byte = self.reader.next_byte()?;
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }

    /// Consumes a byte already seen through `peek`.
    fn advance(&mut self) {
        self.reader.consume(1);
        self.position += 1;
    }

    fn error(&self, message: &str) -> Error {
        Error::Protocol {
            position: self.position,
            message: message.to_string(),
        }
    }
}

/// Reader over a deferred literal, returned by [`ResponseParser::literal`].
#[derive(Debug)]
pub struct LiteralReader<'a, R: BufRead> {
    inner: FixedLengthReader<&'a mut R>,
    pending: &'a mut u64,
    position: &'a mut u64,
}

impl<R: BufRead> LiteralReader<'_, R> {
    /// Number of literal bytes not yet read.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.inner.remaining()
    }
}

impl<R: BufRead> Read for LiteralReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: BufRead> Drop for LiteralReader<'_, R> {
    fn drop(&mut self) {
        let consumed = self.inner.length() - self.inner.remaining();
        *self.position += consumed;
        *self.pending = self.inner.remaining();
    }
}

const fn is_atom_terminator(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'{' | b'[' | b']' | b'"' | b' ') || b < 0x20 || b == 0x7f
}

/// Caps the up-front allocation for a literal at 64 KiB.
fn capacity_hint(length: u64) -> usize {
    usize::try_from(length).map_or(0, |n| n.min(64 * 1024))
}

fn first_error(errors: Vec<BoxError>) -> Option<BoxError> {
    let mut errors = errors.into_iter();
    let first = errors.next()?;
    for later in errors {
        tracing::debug!(error = %later, "additional literal handler failure");
    }
    Some(first)
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

    type HandlerResult = std::result::Result<LiteralAction, LiteralError>;

    fn parse(input: &[u8]) -> Result<Response> {
        ResponseParser::new(input).read_response()
    }

    #[test]
    fn test_untagged_fetch() {
        let response = parse(b"* 1 FETCH (UID 5)\r\n").unwrap();

        assert!(response.tag().is_none());
        assert!(!response.is_continuation_requested());
        assert!(response.is_completed());
        assert_eq!(response.len(), 3);
        assert_eq!(response.get_string(0).unwrap(), "1");
        assert_eq!(response.get_string(1).unwrap(), "FETCH");

        let items = response.get_list(2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.get_keyed_string("UID"), Some("5"));
    }

    #[test]
    fn test_tagged_response() {
        let response = parse(b"A001 OK [READ-WRITE] SELECT completed\r\n").unwrap();

        assert_eq!(response.tag(), Some("A001"));
        assert_eq!(response.get_string(0).unwrap(), "OK");
        let code = response.get_list(1).unwrap();
        assert!(matches!(response.get(1), Some(Token::Sequence(_))));
        assert_eq!(code.get_string(0).unwrap(), "READ-WRITE");
        assert_eq!(response.get_string(3).unwrap(), "completed");
    }

    #[test]
    fn test_continuation_request() {
        let response = parse(b"+ Ready for literal\r\n").unwrap();

        assert!(response.is_continuation_requested());
        assert!(response.tag().is_none());
        assert_eq!(response.get_string(0).unwrap(), "Ready");
    }

    #[test]
    fn test_bare_continuation() {
        let response = parse(b"+\r\n").unwrap();
        assert!(response.is_continuation_requested());
        assert!(response.is_empty());
    }

    #[test]
    fn test_quoted_escape() {
        let response = parse(b"* \"a\\\"b\"\r\n").unwrap();
        assert_eq!(response.get(0), Some(&Token::quoted("a\"b")));
    }

    #[test]
    fn test_quoted_unterminated() {
        let err = parse(b"* \"abc").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_top_level_literal_consumes_exactly_its_length() {
        let mut parser = ResponseParser::new(&b"* {5}\r\nhello\r\nA1 OK\r\n"[..]);
        let response = parser.read_response().unwrap();

        assert_eq!(response.len(), 1);
        assert_eq!(response.get_string(0).unwrap(), "hello");
        assert_eq!(parser.position(), 14);

        let next = parser.read_response().unwrap();
        assert_eq!(next.tag(), Some("A1"));
    }

    #[test]
    fn test_zero_length_literal() {
        let response = parse(b"* X {0}\r\n Y\r\n").unwrap();
        assert_eq!(response.get_literal(1).unwrap().len(), 0);
        assert_eq!(response.get_string(2).unwrap(), "Y");
    }

    #[test]
    fn test_literal_in_nested_list() {
        let response = parse(b"* 1 FETCH (BODY[TEXT] {3}\r\nabc FLAGS (\\Seen))\r\n").unwrap();
        let items = response.get_list(2).unwrap();

        assert_eq!(items.get_string(0).unwrap(), "BODY");
        assert_eq!(items.get_list(1).unwrap().get_string(0).unwrap(), "TEXT");
        assert_eq!(items.get_literal(2).unwrap().as_ref(), b"abc");
        assert_eq!(
            items.get_keyed_list("FLAGS").unwrap().get_string(0).unwrap(),
            "\\Seen"
        );
    }

    #[test]
    fn test_stray_close_at_top_level_is_dropped() {
        let response = parse(b"* A ) B ]\r\n").unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(response.get_string(1).unwrap(), "B");
    }

    #[test]
    fn test_bare_lf_terminates() {
        let response = parse(b"* OK done\n").unwrap();
        assert!(response.is_completed());
        assert_eq!(response.len(), 2);
    }

    #[test]
    fn test_empty_atom_is_fatal() {
        let err = parse(b"* OK \x01\r\n").unwrap_err();
        assert!(matches!(err, Error::Protocol { ref message, .. } if message == "empty atom"));
    }

    #[test]
    fn test_end_of_stream_mid_response() {
        assert!(matches!(
            parse(b"* 1 FETCH (UID").unwrap_err(),
            Error::Protocol { .. }
        ));
        assert!(matches!(parse(b"").unwrap_err(), Error::Protocol { .. }));
    }

    #[test]
    fn test_mismatched_close_in_list() {
        let err = parse(b"* (A ]\r\n").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_handler_substitutes_token() {
        let mut parser = ResponseParser::new(&b"* 1 FETCH (BODY[] {11}\r\nhello world)\r\n"[..]);
        let mut handler = |_: &Response, literal: &mut dyn Read| -> HandlerResult {
            let mut head = [0u8; 5];
            literal.read_exact(&mut head)?;
            Ok(LiteralAction::Substitute(Token::atom(
                String::from_utf8_lossy(&head).into_owned(),
            )))
        };

        let response = parser.read_response_with(&mut handler).unwrap();
        let items = response.get_list(2).unwrap();
        assert_eq!(items.get_string(2).unwrap(), "hello");
        assert!(response.is_completed());
    }

    #[test]
    fn test_handler_error_is_deferred() {
        let input = b"* 1 FETCH (BODY[] {3}\r\nabc UID 7)\r\nA1 OK\r\n";
        let mut parser = ResponseParser::new(&input[..]);
        let mut handler =
            |_: &Response, _: &mut dyn Read| -> HandlerResult { Err(LiteralError::handler("disk full")) };

        let err = parser.read_response_with(&mut handler).unwrap_err();
        let Error::LiteralHandler { source, response } = err else {
            panic!("expected literal handler error");
        };
        assert_eq!(source.to_string(), "disk full");
        assert!(response.is_completed());
        let items = response.get_list(2).unwrap();
        assert_eq!(items.get_keyed_string("UID"), Some("7"));

        let next = parser.read_response().unwrap();
        assert_eq!(next.tag(), Some("A1"));
    }

    #[test]
    fn test_handler_io_error_aborts() {
        let mut parser = ResponseParser::new(&b"* {3}\r\nabc\r\n"[..]);
        let mut handler = |_: &Response, _: &mut dyn Read| -> HandlerResult {
            Err(io::Error::other("socket reset").into())
        };

        let err = parser.read_response_with(&mut handler).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_partial_read_without_token_is_error() {
        let mut parser = ResponseParser::new(&b"* {4}\r\nabcd X\r\n"[..]);
        let mut handler = |_: &Response, literal: &mut dyn Read| -> HandlerResult {
            let mut one = [0u8; 1];
            literal.read_exact(&mut one)?;
            Ok(LiteralAction::Buffer)
        };

        let err = parser.read_response_with(&mut handler).unwrap_err();
        let Error::LiteralHandler { response, .. } = err else {
            panic!("expected literal handler error");
        };
        assert_eq!(response.get_string(1).unwrap(), "X");
    }

    #[test]
    fn test_deferred_literal() {
        let input = b"* 1 FETCH {5}\r\nhello UID 9\r\nA1 OK\r\n";
        let mut parser = ResponseParser::new(&input[..]);

        let mut response = parser.read_response_with(&mut DeferLiterals).unwrap();
        assert!(!response.is_completed());
        assert_eq!(response.len(), 2);

        let mut body = String::new();
        parser.literal().unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "hello");

        assert!(parser.more(&mut response).unwrap());
        assert!(response.is_completed());
        assert_eq!(response.get_keyed_string("UID"), Some("9"));
        assert!(parser.literal().is_none());

        let next = parser.read_response().unwrap();
        assert_eq!(next.tag(), Some("A1"));
    }

    #[test]
    fn test_unread_deferred_literal_is_skipped() {
        let input = b"* X {5}\r\nhello Y\r\n* Z\r\n";
        let mut parser = ResponseParser::new(&input[..]);

        let mut response = parser.read_response_with(&mut DeferLiterals).unwrap();
        {
            let mut literal = parser.literal().unwrap();
            let mut two = [0u8; 2];
            literal.read_exact(&mut two).unwrap();
            assert_eq!(literal.remaining(), 3);
        }

        assert!(parser.more(&mut response).unwrap());
        assert_eq!(response.get_string(1).unwrap(), "Y");
        assert_eq!(parser.read_response().unwrap().get_string(0).unwrap(), "Z");
    }

    #[test]
    fn test_abandoned_suspension_is_discarded() {
        let input = b"* X {5}\r\nhello Y\r\nA2 NO\r\n";
        let mut parser = ResponseParser::new(&input[..]);

        let response = parser.read_response_with(&mut DeferLiterals).unwrap();
        assert!(!response.is_completed());

        let next = parser.read_response().unwrap();
        assert_eq!(next.tag(), Some("A2"));
        assert_eq!(next.get_string(0).unwrap(), "NO");
    }

    #[test]
    fn test_defer_inside_list_buffers() {
        let mut parser = ResponseParser::new(&b"* (A {2}\r\nhi)\r\n"[..]);
        let response = parser.read_response_with(&mut DeferLiterals).unwrap();

        assert!(response.is_completed());
        let list = response.get_list(0).unwrap();
        assert_eq!(list.get_literal(1).unwrap().as_ref(), b"hi");
    }

    #[test]
    fn test_parser_is_reusable() {
        let input = b"* 2 EXISTS\r\n* 0 RECENT\r\nA3 OK done\r\n";
        let mut parser = ResponseParser::new(&input[..]);

        assert_eq!(parser.read_response().unwrap().get_number(0).unwrap(), 2);
        assert_eq!(parser.read_response().unwrap().get_number(0).unwrap(), 0);
        assert_eq!(parser.read_response().unwrap().tag(), Some("A3"));
        assert_eq!(parser.position(), input.len() as u64);
    }
}
