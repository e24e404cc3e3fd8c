//! Credential encoding for `AUTH` and `APOP`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};

use crate::error::{Error, Result};

type HmacMd5 = Hmac<Md5>;

/// Builds the `AUTH PLAIN` response: base64 of `\0user\0password`.
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    BASE64.encode(format!("\0{username}\0{password}"))
}

/// Answers a CRAM-MD5 challenge.
///
/// `challenge` is the base64 text the server sent after `+ `.
///
/// # Errors
///
/// Returns an error if the challenge is not valid base64.
pub fn cram_md5_response(challenge: &str, username: &str, password: &str) -> Result<String> {
    let challenge = BASE64
        .decode(challenge.trim())
        .map_err(|e| Error::Protocol(format!("Invalid CRAM-MD5 challenge: {e}")))?;

    let mut mac = HmacMd5::new_from_slice(password.as_bytes())
        .map_err(|e| Error::Protocol(format!("HMAC error: {e}")))?;
    mac.update(&challenge);
    let digest = hex(&mac.finalize().into_bytes());

    Ok(BASE64.encode(format!("{username} {digest}")))
}

/// Extracts the `<...>` timestamp from a server greeting.
#[must_use]
pub fn apop_timestamp(greeting: &str) -> Option<&str> {
    let start = greeting.find('<')?;
    let end = start + greeting[start..].find('>')?;
    Some(&greeting[start..=end])
}

/// Computes the `APOP` digest: hex MD5 of timestamp followed by password.
#[must_use]
pub fn apop_digest(timestamp: &str, password: &str) -> String {
    let mut md5 = Md5::new();
    md5.update(timestamp.as_bytes());
    md5.update(password.as_bytes());
    hex(&md5.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response() {
        assert_eq!(plain_response("tim", "tanstaaf"), "AHRpbQB0YW5zdGFhZg==");
    }

    #[test]
    fn test_cram_md5_rfc2195_example() {
        let response = cram_md5_response(
            "PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+",
            "tim",
            "tanstaaftanstaaf",
        )
        .unwrap();
        assert_eq!(response, "dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw");
    }

    #[test]
    fn test_cram_md5_bad_challenge() {
        assert!(cram_md5_response("not base64!", "tim", "x").is_err());
    }

    #[test]
    fn test_apop_rfc1939_example() {
        let greeting = "+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>";
        let timestamp = apop_timestamp(greeting).unwrap();
        assert_eq!(timestamp, "<1896.697170952@dbc.mtview.ca.us>");
        assert_eq!(
            apop_digest(timestamp, "tanstaaf"),
            "c4c9334bac560ecc979e58001b3e22fb"
        );
    }

    #[test]
    fn test_apop_without_timestamp() {
        assert!(apop_timestamp("+OK ready").is_none());
        assert!(apop_timestamp("+OK ready <unterminated").is_none());
    }
}
