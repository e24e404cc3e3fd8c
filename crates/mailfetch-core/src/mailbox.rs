//! Locally kept copy of a POP3 mailbox.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use mailfetch_pop3::{Flag, Pop3Message};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A downloaded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Unique identifier on the server.
    pub uid: String,
    /// Size reported by the server.
    pub size: Option<u64>,
    /// True if the whole message was downloaded.
    pub complete: bool,
    /// Downloaded content.
    pub content: Option<Vec<u8>>,
    /// When the message was stored.
    pub stored_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Captures a fetched message.
    #[must_use]
    pub fn from_message(message: &Pop3Message) -> Self {
        Self {
            uid: message.uid().to_string(),
            size: message.size(),
            complete: message.has_flag(Flag::DownloadedFull),
            content: message.body().map(|body| body.to_vec()),
            stored_at: Utc::now(),
        }
    }
}

/// Messages downloaded from one mailbox, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxState {
    messages: BTreeMap<String, StoredMessage>,
}

impl MailboxState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns true if `uid` has been downloaded.
    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        self.messages.contains_key(uid)
    }

    /// Stored message for `uid`.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&StoredMessage> {
        self.messages.get(uid)
    }

    /// Iterates stored messages in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredMessage> {
        self.messages.values()
    }

    /// Stores `message`, replacing an earlier copy.
    pub fn record(&mut self, message: &Pop3Message) {
        self.messages
            .insert(message.uid().to_string(), StoredMessage::from_message(message));
    }

    /// Forgets messages the server no longer lists.
    ///
    /// Returns how many were removed.
    pub fn retain_listed(&mut self, listed: &HashSet<&str>) -> usize {
        let before = self.messages.len();
        self.messages.retain(|uid, _| listed.contains(uid.as_str()));
        before - self.messages.len()
    }

    /// Serializes the state to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a state saved with [`MailboxState::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid state.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(uid: &str) -> Pop3Message {
        let mut message = Pop3Message::new(uid);
        message.set_body(Some("Subject: hi\r\n\r\n".into()));
        message.set_flag(Flag::DownloadedFull, true);
        message
    }

    #[test]
    fn test_record_and_lookup() {
        let mut state = MailboxState::new();
        state.record(&message("aaa"));

        let stored = state.get("aaa").unwrap();
        assert!(stored.complete);
        assert_eq!(stored.content.as_deref(), Some(b"Subject: hi\r\n\r\n".as_slice()));
        assert!(state.contains("aaa"));
        assert!(!state.contains("bbb"));
    }

    #[test]
    fn test_retain_listed() {
        let mut state = MailboxState::new();
        state.record(&message("aaa"));
        state.record(&message("bbb"));

        let listed: HashSet<&str> = ["bbb"].into_iter().collect();
        assert_eq!(state.retain_listed(&listed), 1);
        assert_eq!(state.len(), 1);
        assert!(state.contains("bbb"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut state = MailboxState::new();
        state.record(&message("aaa"));

        let json = state.to_json().unwrap();
        assert_eq!(MailboxState::from_json(&json).unwrap(), state);
        assert!(MailboxState::from_json("{").is_err());
    }
}
