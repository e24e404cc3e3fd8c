//! Ordered token container with positional and keyed lookup.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

use super::Token;
use crate::error::{Error, Result};
use crate::time::parse_datetime;

/// An ordered sequence of tokens.
///
/// Besides positional access, a list supports keyed lookup: the list is
/// scanned for a string token matching the key (ignoring ASCII case) and the
/// element directly after it is returned. The first match wins. A key that
/// only appears as the last element has no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseList {
    tokens: Vec<Token>,
}

impl ResponseList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Appends a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the list holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the token at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Iterates over the tokens in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Returns the tokens as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Consumes the list, returning its tokens.
    #[must_use]
    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }

    /// Returns the string at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the index is out of range or the
    /// token is not a string.
    pub fn get_string(&self, index: usize) -> Result<&str> {
        let token = self.require(index, "string")?;
        token
            .as_str()
            .ok_or_else(|| mismatch("string", index.to_string(), Some(token)))
    }

    /// Returns the number at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the token is missing or not numeric.
    pub fn get_number(&self, index: usize) -> Result<u32> {
        let token = self.require(index, "number")?;
        to_number(token).ok_or_else(|| mismatch("number", index.to_string(), Some(token)))
    }

    /// Returns the list or sequence at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the token is missing or not a list.
    pub fn get_list(&self, index: usize) -> Result<&Self> {
        let token = self.require(index, "list")?;
        token
            .as_list()
            .ok_or_else(|| mismatch("list", index.to_string(), Some(token)))
    }

    /// Returns the literal bytes at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the token is missing or not a literal.
    pub fn get_literal(&self, index: usize) -> Result<&Bytes> {
        let token = self.require(index, "literal")?;
        token
            .as_literal()
            .ok_or_else(|| mismatch("literal", index.to_string(), Some(token)))
    }

    /// Parses the string at `index` as a protocol datetime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the token is not a string, or
    /// [`Error::DateTime`] if no supported format matches.
    pub fn get_date(&self, index: usize) -> Result<DateTime<FixedOffset>> {
        parse_datetime(self.get_string(index)?)
    }

    /// Position of the first string token equal to `key`, ignoring case.
    #[must_use]
    pub fn key_index(&self, key: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t.eq_ignore_case(key))
    }

    /// Returns true if `key` appears anywhere in the list.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.key_index(key).is_some()
    }

    /// Returns the element following the first occurrence of `key`.
    #[must_use]
    pub fn get_keyed_value(&self, key: &str) -> Option<&Token> {
        self.key_index(key).and_then(|i| self.tokens.get(i + 1))
    }

    /// Keyed lookup returning the value only if it is a string.
    #[must_use]
    pub fn get_keyed_string(&self, key: &str) -> Option<&str> {
        self.get_keyed_value(key).and_then(Token::as_str)
    }

    /// Keyed lookup returning the value only if it is a list or sequence.
    #[must_use]
    pub fn get_keyed_list(&self, key: &str) -> Option<&Self> {
        self.get_keyed_value(key).and_then(Token::as_list)
    }

    /// Keyed lookup of a numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the key is present but its value is
    /// not numeric.
    pub fn get_keyed_number(&self, key: &str) -> Result<Option<u32>> {
        self.get_keyed_value(key)
            .map(|token| {
                to_number(token).ok_or_else(|| mismatch("number", key.to_string(), Some(token)))
            })
            .transpose()
    }

    /// Keyed lookup of a datetime value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateTime`] if the key is present but its value does
    /// not parse.
    pub fn get_keyed_date(&self, key: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_keyed_value(key)
            .map(|token| {
                token
                    .as_str()
                    .ok_or_else(|| mismatch("string", key.to_string(), Some(token)))
                    .and_then(parse_datetime)
            })
            .transpose()
    }

    fn require(&self, index: usize, expected: &'static str) -> Result<&Token> {
        self.tokens
            .get(index)
            .ok_or_else(|| mismatch(expected, index.to_string(), None))
    }
}

fn to_number(token: &Token) -> Option<u32> {
    match token {
        Token::Atom(s) | Token::Quoted(s) => s.parse().ok(),
        _ => None,
    }
}

fn mismatch(expected: &'static str, location: String, found: Option<&Token>) -> Error {
    Error::TypeMismatch {
        expected,
        location,
        found: found.map_or("nothing", Token::kind),
    }
}

impl fmt::Display for ResponseList {
    /// Writes the tokens separated by single spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl From<Vec<Token>> for ResponseList {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl FromIterator<Token> for ResponseList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResponseList {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResponseList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    fn fetch_list() -> ResponseList {
        let flags: ResponseList = vec![Token::atom("\\Seen")].into();
        vec![
            Token::atom("UID"),
            Token::atom("5"),
            Token::atom("FLAGS"),
            Token::List(flags),
            Token::atom("INTERNALDATE"),
            Token::quoted("17-Jul-1996 02:44:25 -0700"),
            Token::atom("RFC822.SIZE"),
        ]
        .into()
    }

    #[test]
    fn test_keyed_lookup_ignores_case() {
        let list = fetch_list();
        assert_eq!(list.get_keyed_string("uid"), Some("5"));
        assert_eq!(list.get_keyed_number("UID").unwrap(), Some(5));
        assert_eq!(list.key_index("flags"), Some(2));
        assert!(list.contains_key("Rfc822.Size"));
    }

    #[test]
    fn test_keyed_lookup_first_match_wins() {
        let list: ResponseList = vec![
            Token::atom("X"),
            Token::atom("1"),
            Token::atom("X"),
            Token::atom("2"),
        ]
        .into();
        assert_eq!(list.get_keyed_string("x"), Some("1"));
    }

    #[test]
    fn test_keyed_lookup_last_element_has_no_value() {
        let list = fetch_list();
        assert!(list.get_keyed_value("RFC822.SIZE").is_none());
        assert!(list.get_keyed_value("MISSING").is_none());
        assert_eq!(list.get_keyed_number("MISSING").unwrap(), None);
    }

    #[test]
    fn test_keyed_list_and_date() {
        let list = fetch_list();
        let flags = list.get_keyed_list("FLAGS").unwrap();
        assert_eq!(flags.get_string(0).unwrap(), "\\Seen");

        let date = list.get_keyed_date("INTERNALDATE").unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25-07:00");
    }

    #[test]
    fn test_typed_accessor_mismatch() {
        let list = fetch_list();
        let err = list.get_list(0).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "list",
                found: "atom",
                ..
            }
        ));

        let err = list.get_string(99).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { found: "nothing", .. }));

        assert!(list.get_keyed_number("FLAGS").is_err());
    }

    #[test]
    fn test_display_joins_with_spaces() {
        let list = fetch_list();
        assert_eq!(
            list.to_string(),
            "UID 5 FLAGS (\\Seen) INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" RFC822.SIZE"
        );
    }
}
