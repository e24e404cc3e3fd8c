//! Connection configuration types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest line a partial download is assumed to have.
const MAX_LINE_LENGTH: u32 = 76;

/// Connection security mode.
///
/// The "optional" variants encrypt the connection but accept any server
/// certificate. The "required" variants validate the certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (port 110). **Not recommended for production.**
    None,
    /// Upgrade with STLS if the server offers it (port 110).
    StartTlsOptional,
    /// Upgrade with STLS; fail if the server does not offer it (port 110).
    StartTlsRequired,
    /// TLS from the start without certificate validation (port 995).
    TlsOptional,
    /// TLS from the start (port 995). **Recommended.**
    #[default]
    TlsRequired,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTlsOptional | Self::StartTlsRequired => 110,
            Self::TlsOptional | Self::TlsRequired => 995,
        }
    }

    /// Returns true if the connection starts with a TLS handshake.
    #[must_use]
    pub const fn is_implicit_tls(self) -> bool {
        matches!(self, Self::TlsOptional | Self::TlsRequired)
    }

    /// Returns true if the server certificate must be validated.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::StartTlsRequired | Self::TlsRequired)
    }
}

/// How credentials are sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthType {
    /// `AUTH PLAIN` if advertised, otherwise `USER`/`PASS`.
    #[default]
    Plain,
    /// `AUTH CRAM-MD5` if advertised, otherwise `APOP`.
    CramMd5,
    /// `APOP` digest using the timestamp from the server greeting.
    Apop,
}

/// POP3 connection configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Authentication mechanism.
    pub auth_type: AuthType,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read/write timeout.
    pub io_timeout: Duration,
    /// Download size budget for partial fetches, in bytes. Zero disables
    /// partial fetches.
    pub max_download_size: u32,
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 995.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConfigBuilder::new(host).credentials(username, password).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Number of lines to request when only part of a message is wanted.
    ///
    /// Derived from the download budget by assuming 76-byte lines.
    #[must_use]
    pub const fn partial_fetch_lines(&self) -> u32 {
        self.max_download_size / MAX_LINE_LENGTH
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("auth_type", &self.auth_type)
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .field("max_download_size", &self.max_download_size)
            .finish()
    }
}

/// Builder for connection configuration.
#[derive(Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    username: String,
    password: String,
    auth_type: AuthType,
    connect_timeout: Duration,
    io_timeout: Duration,
    max_download_size: u32,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::TlsRequired,
            username: String::new(),
            password: String::new(),
            auth_type: AuthType::Plain,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            max_download_size: 32 * 1024,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the login name and password.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the authentication mechanism.
    #[must_use]
    pub const fn auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = auth_type;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the download size budget for partial fetches.
    #[must_use]
    pub const fn max_download_size(mut self, bytes: u32) -> Self {
        self.max_download_size = bytes;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            username: self.username,
            password: self.password,
            auth_type: self.auth_type,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            max_download_size: self.max_download_size,
        }
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("auth_type", &self.auth_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 110);
        assert_eq!(Security::StartTlsOptional.default_port(), 110);
        assert_eq!(Security::StartTlsRequired.default_port(), 110);
        assert_eq!(Security::TlsOptional.default_port(), 995);
        assert_eq!(Security::TlsRequired.default_port(), 995);
    }

    #[test]
    fn test_strictness() {
        assert!(Security::TlsRequired.is_strict());
        assert!(Security::StartTlsRequired.is_strict());
        assert!(!Security::TlsOptional.is_strict());
        assert!(!Security::StartTlsOptional.is_strict());
        assert!(Security::TlsOptional.is_implicit_tls());
        assert!(!Security::StartTlsRequired.is_implicit_tls());
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("pop.example.com", "alice", "secret");
        assert_eq!(config.host, "pop.example.com");
        assert_eq!(config.port, 995);
        assert_eq!(config.security, Security::TlsRequired);
        assert_eq!(config.auth_type, AuthType::Plain);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.io_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_config_builder_default_port() {
        let config = Config::builder("pop.example.com")
            .security(Security::StartTlsRequired)
            .auth_type(AuthType::CramMd5)
            .build();

        assert_eq!(config.port, 110);
        assert_eq!(config.auth_type, AuthType::CramMd5);
    }

    #[test]
    fn test_partial_fetch_lines() {
        let config = Config::builder("pop.example.com").build();
        assert_eq!(config.partial_fetch_lines(), 431);

        let config = Config::builder("pop.example.com").max_download_size(0).build();
        assert_eq!(config.partial_fetch_lines(), 0);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::new("pop.example.com", "alice", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_config_serde() {
        let config = Config::builder("pop.example.com")
            .security(Security::StartTlsOptional)
            .credentials("alice", "secret")
            .auth_type(AuthType::Apop)
            .build();

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"StartTlsOptional\""));
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
