//! Error types for the core library.

use thiserror::Error;

/// Boxed error raised by a unit of work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// POP3 operation failed.
    #[error("POP3 error: {0}")]
    Pop3(#[from] mailfetch_pop3::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A unit of work failed.
    #[error("Unit of work failed: {0}")]
    Work(#[source] BoxError),

    /// A write was attempted in a scope holding the read lock.
    #[error("Cannot write while holding the read lock")]
    ReadOnly,
}

impl Error {
    /// Wraps any error raised inside a unit of work.
    pub fn work(error: impl Into<BoxError>) -> Self {
        Self::Work(error.into())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
