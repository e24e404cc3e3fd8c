//! Response tokens.

use std::fmt;

use bytes::Bytes;

use super::ResponseList;

/// A single element of a parsed response.
///
/// `NIL` is not a distinct variant: it arrives as the atom `NIL` and is left
/// to the consumer to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Unquoted string delimited by structural characters or whitespace.
    Atom(String),
    /// Double-quoted string with escapes already removed.
    Quoted(String),
    /// Length-prefixed payload, buffered or substituted by a literal handler.
    Literal(Bytes),
    /// Parenthesized list.
    List(ResponseList),
    /// Bracketed sequence, as used by response codes.
    Sequence(ResponseList),
}

impl Token {
    /// Creates an atom token.
    #[must_use]
    pub fn atom(value: impl Into<String>) -> Self {
        Self::Atom(value.into())
    }

    /// Creates a quoted string token.
    #[must_use]
    pub fn quoted(value: impl Into<String>) -> Self {
        Self::Quoted(value.into())
    }

    /// Creates a literal token.
    #[must_use]
    pub fn literal(value: impl Into<Bytes>) -> Self {
        Self::Literal(value.into())
    }

    /// Returns the string value of an atom, quoted string, or UTF-8 literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Atom(s) | Self::Quoted(s) => Some(s),
            Self::Literal(bytes) => std::str::from_utf8(bytes).ok(),
            Self::List(_) | Self::Sequence(_) => None,
        }
    }

    /// Returns the contents of a list or sequence.
    #[must_use]
    pub const fn as_list(&self) -> Option<&ResponseList> {
        match self {
            Self::List(list) | Self::Sequence(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the raw bytes of a literal.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Bytes> {
        match self {
            Self::Literal(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns true if this token is a string equal to `value`, ignoring ASCII case.
    #[must_use]
    pub fn eq_ignore_case(&self, value: &str) -> bool {
        self.as_str().is_some_and(|s| s.eq_ignore_ascii_case(value))
    }

    /// Short name of the token kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Atom(_) => "atom",
            Self::Quoted(_) => "quoted string",
            Self::Literal(_) => "literal",
            Self::List(_) => "list",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl fmt::Display for Token {
    /// Writes the token in wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(s) => f.write_str(s),
            Self::Quoted(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Literal(bytes) => {
                write!(f, "{{{}}}\r\n{}", bytes.len(), String::from_utf8_lossy(bytes))
            }
            Self::List(list) => write!(f, "({list})"),
            Self::Sequence(list) => write!(f, "[{list}]"),
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::Atom(value.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        assert_eq!(Token::atom("OK").as_str(), Some("OK"));
        assert_eq!(Token::quoted("a b").as_str(), Some("a b"));
        assert_eq!(Token::literal(&b"hello"[..]).as_str(), Some("hello"));
        assert_eq!(Token::literal(&[0xffu8, 0xfe][..]).as_str(), None);
        assert_eq!(Token::List(ResponseList::new()).as_str(), None);
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(Token::atom("uid").eq_ignore_case("UID"));
        assert!(Token::quoted("Uid").eq_ignore_case("UID"));
        assert!(!Token::atom("UIDS").eq_ignore_case("UID"));
    }

    #[test]
    fn test_display_quoted_escapes() {
        assert_eq!(Token::quoted(r#"a"b\c"#).to_string(), r#""a\"b\\c""#);
    }

    #[test]
    fn test_display_nested() {
        let mut inner = ResponseList::new();
        inner.push(Token::atom("TEXT"));
        let mut list = ResponseList::new();
        list.push(Token::atom("BODY"));
        list.push(Token::Sequence(inner));
        list.push(Token::literal(&b"hi"[..]));

        assert_eq!(Token::List(list).to_string(), "(BODY [TEXT] {2}\r\nhi)");
    }
}
