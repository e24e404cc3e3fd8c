//! POP3 command builder.

use std::fmt;

/// POP3 command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPA - List capabilities
    Capa,
    /// STAT - Message count and mailbox size
    Stat,
    /// UIDL - Unique identifier of one message, or of all when `None`
    Uidl(Option<u32>),
    /// LIST - Size of one message, or of all when `None`
    List(Option<u32>),
    /// TOP - Headers plus the first lines of the body
    Top {
        /// Message number
        number: u32,
        /// Body lines to return
        lines: u32,
    },
    /// RETR - Whole message
    Retr(u32),
    /// DELE - Mark message deleted
    Dele(u32),
    /// STLS - Upgrade to TLS
    Stls,
    /// USER - Login name
    User(String),
    /// PASS - Password
    Pass(String),
    /// APOP - Digest login
    Apop {
        /// Login name
        username: String,
        /// Hex MD5 of greeting timestamp and password
        digest: String,
    },
    /// AUTH - Begin SASL exchange
    Auth(String),
    /// Bare SASL response line
    AuthResponse(String),
    /// QUIT - End session
    Quit,
}

impl Command {
    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.line().into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns true if the command carries credentials.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::Pass(_) | Self::Apop { .. } | Self::AuthResponse(_)
        )
    }

    fn line(&self) -> String {
        match self {
            Self::Capa => "CAPA".to_string(),
            Self::Stat => "STAT".to_string(),
            Self::Uidl(None) => "UIDL".to_string(),
            Self::Uidl(Some(n)) => format!("UIDL {n}"),
            Self::List(None) => "LIST".to_string(),
            Self::List(Some(n)) => format!("LIST {n}"),
            Self::Top { number, lines } => format!("TOP {number} {lines}"),
            Self::Retr(n) => format!("RETR {n}"),
            Self::Dele(n) => format!("DELE {n}"),
            Self::Stls => "STLS".to_string(),
            Self::User(name) => format!("USER {name}"),
            Self::Pass(password) => format!("PASS {password}"),
            Self::Apop { username, digest } => format!("APOP {username} {digest}"),
            Self::Auth(mechanism) => format!("AUTH {mechanism}"),
            Self::AuthResponse(response) => response.clone(),
            Self::Quit => "QUIT".to_string(),
        }
    }
}

impl fmt::Display for Command {
    /// Writes the command line, hiding credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sensitive() {
            f.write_str("[sensitive command hidden]")
        } else {
            f.write_str(&self.line())
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        assert_eq!(Command::Capa.serialize(), b"CAPA\r\n");
        assert_eq!(Command::Uidl(None).serialize(), b"UIDL\r\n");
        assert_eq!(Command::Uidl(Some(3)).serialize(), b"UIDL 3\r\n");
        assert_eq!(
            Command::Top {
                number: 4,
                lines: 431
            }
            .serialize(),
            b"TOP 4 431\r\n"
        );
        assert_eq!(Command::Dele(12).serialize(), b"DELE 12\r\n");
        assert_eq!(
            Command::User("alice".into()).serialize(),
            b"USER alice\r\n"
        );
    }

    #[test]
    fn test_sensitive_commands_are_hidden() {
        let pass = Command::Pass("hunter2".into());
        assert!(pass.is_sensitive());
        assert_eq!(pass.serialize(), b"PASS hunter2\r\n");
        assert_eq!(pass.to_string(), "[sensitive command hidden]");
        assert!(!format!("{pass:?}").contains("hunter2"));

        assert!(!Command::User("alice".into()).is_sensitive());
        assert_eq!(Command::Retr(1).to_string(), "RETR 1");
    }
}
