//! Literal handling.
//!
//! When the tokenizer meets `{n}\r\n`, it hands a reader bounded to exactly
//! `n` bytes to a [`LiteralHandler`]. The handler may stream the payload
//! somewhere else and return a substitute token, ask for the payload to be
//! buffered as a [`Token::Literal`], or defer it to the caller.
//!
//! Whatever the handler leaves unread is drained before parsing resumes, so
//! the byte source never ends up in the middle of a literal.

use std::io::{self, Read};

use thiserror::Error;

use crate::types::{Response, Token};

/// Boxed error raised by a literal handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What the tokenizer should do with a literal after the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralAction {
    /// Use this token in place of the literal. Unread bytes are discarded.
    Substitute(Token),
    /// Read the literal into memory. Only valid if the handler read nothing.
    Buffer,
    /// Leave the literal on the byte source and return the response early.
    ///
    /// The response comes back with `completed == false`. The payload is
    /// available through [`ResponseParser::literal`](crate::ResponseParser::literal)
    /// and parsing resumes with [`ResponseParser::more`](crate::ResponseParser::more).
    /// Only honored at the top level of a response; inside a list it behaves
    /// like [`LiteralAction::Buffer`].
    Defer,
}

/// Error returned by a literal handler.
#[derive(Debug, Error)]
pub enum LiteralError {
    /// Reading the literal failed. Aborts the parse immediately.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The handler itself failed. Parsing continues to the end of the
    /// response, then the first such error is returned.
    #[error(transparent)]
    Handler(BoxError),
}

impl LiteralError {
    /// Wraps any handler error.
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }
}

/// Callback invoked for each non-empty literal.
pub trait LiteralHandler {
    /// Handles one literal.
    ///
    /// `response` holds the top-level tokens parsed so far. `literal` yields
    /// exactly the announced number of bytes.
    ///
    /// # Errors
    ///
    /// Return [`LiteralError::Io`] for failures reading `literal` and
    /// [`LiteralError::Handler`] for anything else.
    fn handle(
        &mut self,
        response: &Response,
        literal: &mut dyn Read,
    ) -> Result<LiteralAction, LiteralError>;
}

impl<F> LiteralHandler for F
where
    F: FnMut(&Response, &mut dyn Read) -> Result<LiteralAction, LiteralError>,
{
    fn handle(
        &mut self,
        response: &Response,
        literal: &mut dyn Read,
    ) -> Result<LiteralAction, LiteralError> {
        self(response, literal)
    }
}

/// Buffers every literal in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct BufferLiterals;

impl LiteralHandler for BufferLiterals {
    fn handle(&mut self, _: &Response, _: &mut dyn Read) -> Result<LiteralAction, LiteralError> {
        Ok(LiteralAction::Buffer)
    }
}

/// Defers every top-level literal to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferLiterals;

impl LiteralHandler for DeferLiterals {
    fn handle(&mut self, _: &Response, _: &mut dyn Read) -> Result<LiteralAction, LiteralError> {
        Ok(LiteralAction::Defer)
    }
}
