//! Server capabilities discovered with `CAPA`.

/// Capability flags for one session.
///
/// Built by probing right after the greeting and kept for the lifetime of
/// the connection. A reconnect probes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// `STLS` - TLS upgrade.
    pub stls: bool,
    /// `UIDL` - Unique identifiers.
    pub uidl: bool,
    /// `PIPELINING` - Detected, but commands are never pipelined.
    pub pipelining: bool,
    /// `USER` - `USER`/`PASS` login.
    pub user: bool,
    /// `TOP` - Partial downloads. Also set once `TOP` has worked.
    pub top: bool,
    /// `SASL PLAIN`.
    pub sasl_plain: bool,
    /// `SASL CRAM-MD5`.
    pub sasl_cram_md5: bool,
    /// `TOP` should not be tried.
    ///
    /// Set when `CAPA` worked but did not list `TOP`, or when a live `TOP`
    /// attempt was rejected by a server that never advertised it.
    pub top_not_supported: bool,
}

impl Capabilities {
    /// Builds capabilities from the lines of a successful `CAPA` response.
    #[must_use]
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut caps = Self::default();
        for line in lines {
            caps.apply(line);
        }
        // The list is authoritative once CAPA itself works.
        if !caps.top {
            caps.top_not_supported = true;
        }
        caps
    }

    /// Capabilities of a server that rejected `CAPA`.
    ///
    /// Everything is unknown, so `TOP` may still be probed once.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Returns true if a `TOP` command is worth sending.
    #[must_use]
    pub const fn may_use_top(&self) -> bool {
        self.top || !self.top_not_supported
    }

    fn apply(&mut self, line: &str) {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return;
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STLS" => self.stls = true,
            "UIDL" => self.uidl = true,
            "PIPELINING" => self.pipelining = true,
            "USER" => self.user = true,
            "TOP" => self.top = true,
            "SASL" => {
                for mechanism in parts {
                    match mechanism.to_ascii_uppercase().as_str() {
                        "PLAIN" => self.sasl_plain = true,
                        "CRAM-MD5" => self.sasl_cram_md5 = true,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capa_lines() {
        let caps = Capabilities::from_lines([
            "TOP",
            "uidl",
            "USER",
            "SASL PLAIN cram-md5",
            "PIPELINING",
            "RESP-CODES",
        ]);

        assert!(caps.top);
        assert!(caps.uidl);
        assert!(caps.user);
        assert!(caps.pipelining);
        assert!(caps.sasl_plain);
        assert!(caps.sasl_cram_md5);
        assert!(!caps.stls);
        assert!(!caps.top_not_supported);
        assert!(caps.may_use_top());
    }

    #[test]
    fn test_missing_top_is_authoritative() {
        let caps = Capabilities::from_lines(["UIDL", "STLS"]);
        assert!(caps.stls);
        assert!(!caps.top);
        assert!(caps.top_not_supported);
        assert!(!caps.may_use_top());
    }

    #[test]
    fn test_unknown_allows_top_probe() {
        let caps = Capabilities::unknown();
        assert!(!caps.top);
        assert!(!caps.top_not_supported);
        assert!(caps.may_use_top());
    }
}
