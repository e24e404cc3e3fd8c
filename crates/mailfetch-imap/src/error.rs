//! Error types for the IMAP response tokenizer.

use thiserror::Error;

use crate::types::Response;

/// Errors that can occur while tokenizing IMAP responses.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error reading from the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input or end of stream in the middle of a token.
    ///
    /// The byte source is out of sync with the server after this error and
    /// the connection should be discarded.
    #[error("Protocol error at byte {position}: {message}")]
    Protocol {
        /// Number of bytes consumed from the source when the error occurred.
        position: u64,
        /// Description of what went wrong.
        message: String,
    },

    /// A literal handler failed with a non-I/O error.
    ///
    /// The response was still parsed to its end; it is carried here so the
    /// caller can inspect it.
    #[error("Literal handler failed: {source}")]
    LiteralHandler {
        /// The first error raised by a literal handler.
        source: Box<dyn std::error::Error + Send + Sync>,
        /// The fully parsed response.
        response: Box<Response>,
    },

    /// A value could not be parsed as a protocol datetime.
    #[error("Cannot parse protocol datetime: {0:?}")]
    DateTime(String),

    /// A typed accessor found a token of a different kind.
    #[error("Expected {expected} at {location}, found {found}")]
    TypeMismatch {
        /// Expected token kind.
        expected: &'static str,
        /// Index or key that was looked up.
        location: String,
        /// Kind of the token that was found (or `nothing`).
        found: &'static str,
    },

    /// The tagged status response did not report success.
    #[error("Command {tag} failed: {response}")]
    NegativeResponse {
        /// Tag of the failed command.
        tag: String,
        /// The tagged response, rendered in wire form.
        response: String,
        /// All responses read for the command, including the tagged one.
        responses: Vec<Response>,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
