//! # mailfetch-imap
//!
//! A streaming tokenizer for IMAP-style server responses and the token model
//! it produces.
//!
//! ## Features
//!
//! - **Streaming literals**: `{n}` payloads are handed to a
//!   [`LiteralHandler`] as a reader bounded to exactly `n` bytes, so large
//!   message bodies never have to be buffered whole
//! - **Deferred handler errors**: a failing handler does not desynchronize
//!   the stream; the response is parsed to its end first
//! - **Resumable responses**: a literal can be left to the caller and parsing
//!   resumed afterwards with [`ResponseParser::more`]
//! - **Keyed lookup**: `FETCH` style `KEY value` pairs are found by
//!   case-insensitive key
//! - **Lenient dates**: the standard datetime format plus two common
//!   non-standard ones
//!
//! ## Quick Start
//!
//! ```
//! use mailfetch_imap::{NoopHandler, ResponseParser};
//!
//! let input = b"* 1 FETCH (UID 5 RFC822.SIZE 1024)\r\nA1 OK FETCH completed\r\n";
//! let mut parser = ResponseParser::new(&input[..]);
//!
//! let responses = parser.read_status_response("A1", &mut NoopHandler)?;
//! let items = responses[0].get_list(2)?;
//! assert_eq!(items.get_keyed_number("UID")?, Some(5));
//! assert_eq!(items.get_keyed_number("RFC822.SIZE")?, Some(1024));
//! # Ok::<(), mailfetch_imap::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: The tokenizer and literal handling
//! - [`types`]: Tokens, lists and responses
//! - [`handler`]: Untagged response handlers
//! - [`source`]: Byte source helpers
//! - [`time`]: Protocol datetime parsing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod handler;
pub mod parser;
pub mod source;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use handler::{CollectingHandler, LoggingHandler, NoopHandler, UntaggedHandler};
pub use parser::{
    BoxError, BufferLiterals, DeferLiterals, LiteralAction, LiteralError, LiteralHandler,
    LiteralReader, ResponseParser,
};
pub use source::{ByteSource, FixedLengthReader};
pub use types::{Response, ResponseList, Token};
