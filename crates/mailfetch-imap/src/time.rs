//! Protocol datetime parsing.
//!
//! Servers are supposed to send `INTERNALDATE` style values
//! (`17-Jul-1996 02:44:25 -0700`), but some emit RFC 822 style dates with or
//! without a leading weekday. Each format is tried in order and the first
//! that parses wins.
//!
//! ```
//! use mailfetch_imap::time::parse_datetime;
//!
//! let date = parse_datetime("17-Jul-1996 02:44:25 -0700").unwrap();
//! assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25-07:00");
//! ```

use chrono::{DateTime, FixedOffset};

use crate::error::{Error, Result};

/// Accepted formats, in the order they are tried.
const FORMATS: [&str; 3] = [
    "%d-%b-%Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
];

/// Parses a protocol datetime.
///
/// # Errors
///
/// Returns [`Error::DateTime`] if none of the accepted formats match.
pub fn parse_datetime(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| Error::DateTime(value.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_format() {
        let date = parse_datetime("17-Jul-1996 02:44:25 -0700").unwrap();
        assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25-07:00");
    }

    #[test]
    fn test_single_digit_day_with_leading_space() {
        let date = parse_datetime(" 7-Jul-1996 02:44:25 +0000").unwrap();
        assert_eq!(date.to_rfc3339(), "1996-07-07T02:44:25+00:00");
    }

    #[test]
    fn test_format_without_dashes() {
        let date = parse_datetime("17 Jul 1996 02:44:25 -0700").unwrap();
        assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25-07:00");
    }

    #[test]
    fn test_format_with_weekday() {
        let date = parse_datetime("Wed, 17 Jul 1996 02:44:25 +0200").unwrap();
        assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25+02:00");
    }

    #[test]
    fn test_unparseable() {
        let err = parse_datetime("yesterday").unwrap_err();
        assert!(matches!(err, Error::DateTime(ref v) if v == "yesterday"));
    }
}
