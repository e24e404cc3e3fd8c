//! Message content parsing boundary.
//!
//! The engine downloads and unstuffs message content but does not interpret
//! it. A [`BodyParser`] turns the raw bytes into whatever representation the
//! caller keeps on the [`Pop3Message`].

use bytes::Bytes;

use crate::error::BoxError;
use crate::message::Pop3Message;

/// Parses downloaded message content into a message.
pub trait BodyParser: Send + Sync {
    /// Stores `content` on `message`.
    ///
    /// `partial` is true when only the first lines were requested, in which
    /// case the content may end in the middle of a MIME part.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is malformed.
    fn parse(&self, message: &mut Pop3Message, content: Bytes, partial: bool)
    -> Result<(), BoxError>;
}

/// Stores the content unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawBodyParser;

impl BodyParser for RawBodyParser {
    fn parse(
        &self,
        message: &mut Pop3Message,
        content: Bytes,
        _partial: bool,
    ) -> Result<(), BoxError> {
        message.set_body(Some(content));
        Ok(())
    }
}

/// Checks that the content has a header section before storing it.
///
/// A message must contain an empty line separating headers from the body,
/// unless it was cut short by a partial download.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderCheckParser;

impl BodyParser for HeaderCheckParser {
    fn parse(
        &self,
        message: &mut Pop3Message,
        content: Bytes,
        partial: bool,
    ) -> Result<(), BoxError> {
        let has_separator = content.windows(4).any(|w| w == b"\r\n\r\n")
            || content.windows(2).any(|w| w == b"\n\n");
        if !has_separator && !partial {
            return Err(format!("message {} has no header/body separator", message.uid()).into());
        }
        message.set_body(Some(content));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_parser_stores_content() {
        let mut message = Pop3Message::new("a");
        RawBodyParser
            .parse(&mut message, Bytes::from_static(b"Subject: x\r\n\r\nbody"), false)
            .unwrap();
        assert_eq!(message.body().unwrap().as_ref(), b"Subject: x\r\n\r\nbody");
    }

    #[test]
    fn test_header_check() {
        let mut message = Pop3Message::new("a");
        assert!(
            HeaderCheckParser
                .parse(&mut message, Bytes::from_static(b"garbage"), false)
                .is_err()
        );
        assert!(message.body().is_none());

        HeaderCheckParser
            .parse(&mut message, Bytes::from_static(b"garbage"), true)
            .unwrap();
        assert!(message.body().is_some());
    }
}
