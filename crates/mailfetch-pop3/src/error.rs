//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a [`BodyParser`](crate::BodyParser).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The host name is not a valid TLS server name.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(String),

    /// Connecting, reading or writing took too long.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with `-ERR` (or anything not starting with `+`).
    #[error("Server error: {0}")]
    Server(String),

    /// Credentials were rejected, or the exchange failed while sending them.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// What was being attempted.
        message: String,
        /// The underlying failure, if any.
        #[source]
        source: Option<Box<Error>>,
    },

    /// TLS upgrade was required but the server does not offer `STLS`.
    #[error("Server does not support STLS")]
    TlsUnavailable,

    /// No message number is known for this identifier.
    ///
    /// The message has most likely been removed from the server.
    #[error("No message number found for UID {0}")]
    MessageNotFound(String),

    /// A message range was requested with `start < 1` or `end < start`.
    #[error("Invalid message set {start} {end}")]
    InvalidRange {
        /// First message number.
        start: u32,
        /// Last message number.
        end: u32,
    },

    /// The session is not open.
    #[error("Session is not open")]
    NotConnected,

    /// Unexpected response from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The downloaded message content could not be parsed.
    #[error("Cannot parse message body: {0}")]
    BodyParse(#[source] BoxError),
}

impl Error {
    /// Wraps an error raised during the credential exchange.
    #[must_use]
    pub fn authentication(message: impl Into<String>, source: Self) -> Self {
        Self::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for failures that will not go away by retrying.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::MessageNotFound(_) | Self::TlsUnavailable | Self::InvalidRange { .. }
        )
    }

    /// Returns true if the connection is unusable after this error.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Io(_) | Self::Tls(_) | Self::InvalidDnsName(_) | Self::Timeout(_) => true,
            Self::Authentication { source, .. } => source.as_deref().is_some_and(Self::is_transport),
            _ => false,
        }
    }

    /// Returns true for authentication failures.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::MessageNotFound("abc".into()).is_permanent());
        assert!(Error::TlsUnavailable.is_permanent());
        assert!(!Error::Server("-ERR busy".into()).is_permanent());
        assert!(!Error::Server("-ERR busy".into()).is_transport());
        assert!(Error::Timeout(Duration::from_secs(1)).is_transport());
    }

    #[test]
    fn test_authentication_wraps_source() {
        let err = Error::authentication("USER/PASS failed", Error::Server("-ERR bad".into()));
        assert!(err.is_authentication());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Authentication failed: USER/PASS failed");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Server error: -ERR bad");

        let io = Error::authentication("APOP failed", io::Error::other("reset").into());
        assert!(io.is_transport());
    }
}
