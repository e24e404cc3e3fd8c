//! A single server response.

use std::fmt;
use std::ops::Deref;

use super::{ResponseList, Token};

/// One server response: a token list plus its tag and state flags.
///
/// Dereferences to [`ResponseList`] for positional and keyed access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    list: ResponseList,
    tag: Option<String>,
    continuation_requested: bool,
    completed: bool,
}

impl Response {
    /// Creates an empty untagged response.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            list: ResponseList::new(),
            tag: None,
            continuation_requested: false,
            completed: false,
        }
    }

    /// Tag of a tagged response, `None` for untagged and continuation responses.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns true if this response carries a tag.
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// Returns true if the server asked for more input (`+`).
    #[must_use]
    pub const fn is_continuation_requested(&self) -> bool {
        self.continuation_requested
    }

    /// Returns true once the terminating line ending has been read.
    ///
    /// A response stays incomplete while a deferred literal is pending; see
    /// [`ResponseParser::more`](crate::ResponseParser::more).
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Text following an `[ALERT]` response code, if present.
    #[must_use]
    pub fn alert_text(&self) -> Option<String> {
        let code = self.list.get(1)?.as_list()?;
        if !code.get(0).is_some_and(|t| t.eq_ignore_case("ALERT")) {
            return None;
        }

        let text: Vec<String> = self.list.iter().skip(2).map(ToString::to_string).collect();
        Some(text.join(" "))
    }

    /// Consumes the response, returning its tokens.
    #[must_use]
    pub fn into_list(self) -> ResponseList {
        self.list
    }

    pub(crate) fn set_tag(&mut self, tag: String) {
        self.tag = Some(tag);
    }

    pub(crate) const fn set_continuation_requested(&mut self) {
        self.continuation_requested = true;
    }

    pub(crate) const fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub(crate) fn push(&mut self, token: Token) {
        self.list.push(token);
    }
}

impl Deref for Response {
    type Target = ResponseList;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl fmt::Display for Response {
    /// Writes the response in wire form, without the line ending.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, self.continuation_requested) {
            (_, true) => f.write_str("+")?,
            (Some(tag), false) => f.write_str(tag)?,
            (None, false) => f.write_str("*")?,
        }
        for token in &self.list {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_text() {
        let mut response = Response::new();
        response.push(Token::atom("OK"));
        response.push(Token::Sequence(vec![Token::atom("ALERT")].into()));
        response.push(Token::atom("System"));
        response.push(Token::atom("shutdown"));

        assert_eq!(response.alert_text().as_deref(), Some("System shutdown"));
    }

    #[test]
    fn test_no_alert_text() {
        let mut response = Response::new();
        response.push(Token::atom("OK"));
        response.push(Token::Sequence(vec![Token::atom("READ-WRITE")].into()));
        assert!(response.alert_text().is_none());
    }

    #[test]
    fn test_display() {
        let mut tagged = Response::new();
        tagged.set_tag("A1".to_string());
        tagged.push(Token::atom("OK"));
        assert_eq!(tagged.to_string(), "A1 OK");

        let mut untagged = Response::new();
        untagged.push(Token::atom("3"));
        untagged.push(Token::atom("EXISTS"));
        assert_eq!(untagged.to_string(), "* 3 EXISTS");

        let mut continuation = Response::new();
        continuation.set_continuation_requested();
        assert_eq!(continuation.to_string(), "+");
    }
}
