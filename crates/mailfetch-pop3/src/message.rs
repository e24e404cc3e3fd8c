//! Messages and fetch profiles.

use std::collections::BTreeSet;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Message flag.
///
/// POP3 has no server-side flags; these are the only two the engine acts on
/// or sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Marked for deletion with `DELE`.
    Deleted,
    /// The whole message was downloaded, not just its first lines.
    DownloadedFull,
}

/// A message on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pop3Message {
    uid: String,
    number: Option<u32>,
    size: Option<u64>,
    flags: BTreeSet<Flag>,
    body: Option<Bytes>,
}

impl Pop3Message {
    /// Creates a message known only by its unique identifier.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            number: None,
            size: None,
            flags: BTreeSet::new(),
            body: None,
        }
    }

    /// Unique identifier, stable across sessions.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Message number in the session it was indexed in.
    #[must_use]
    pub const fn number(&self) -> Option<u32> {
        self.number
    }

    /// Size in octets, once fetched.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    /// Downloaded content, once fetched.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns true if `flag` is set.
    #[must_use]
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Sets or clears a flag locally.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    /// Replaces the downloaded content.
    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    pub(crate) const fn set_number(&mut self, number: Option<u32>) {
        self.number = number;
    }

    pub(crate) const fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }
}

/// Something a fetch can retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FetchItem {
    /// Message size.
    Envelope,
    /// The whole message.
    Body,
    /// As much of the message as fits the configured download size.
    BodySane,
    /// MIME structure. Not available over POP3; clears the body instead.
    Structure,
}

/// The set of items wanted from one fetch call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchProfile {
    items: BTreeSet<FetchItem>,
}

impl FetchProfile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item.
    #[must_use]
    pub fn with(mut self, item: FetchItem) -> Self {
        self.items.insert(item);
        self
    }

    /// Returns true if `item` is wanted.
    #[must_use]
    pub fn contains(&self, item: FetchItem) -> bool {
        self.items.contains(&item)
    }

    /// Number of wanted items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is wanted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if sizes are the only thing wanted.
    #[must_use]
    pub fn is_envelope_only(&self) -> bool {
        self.len() == 1 && self.contains(FetchItem::Envelope)
    }
}

impl FromIterator<FetchItem> for FetchProfile {
    fn from_iter<I: IntoIterator<Item = FetchItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut message = Pop3Message::new("abc");
        assert!(!message.has_flag(Flag::Deleted));

        message.set_flag(Flag::Deleted, true);
        assert!(message.has_flag(Flag::Deleted));

        message.set_flag(Flag::Deleted, false);
        assert!(!message.has_flag(Flag::Deleted));
    }

    #[test]
    fn test_new_message_is_unsized() {
        let message = Pop3Message::new("abc");
        assert_eq!(message.uid(), "abc");
        assert_eq!(message.size(), None);
        assert_eq!(message.number(), None);
        assert!(message.body().is_none());
    }

    #[test]
    fn test_envelope_only() {
        let profile = FetchProfile::new().with(FetchItem::Envelope);
        assert!(profile.is_envelope_only());

        let profile: FetchProfile = [FetchItem::Envelope, FetchItem::BodySane]
            .into_iter()
            .collect();
        assert!(!profile.is_envelope_only());
        assert_eq!(profile.len(), 2);
    }
}
