//! Message number / identifier index.

use std::collections::{BTreeMap, HashMap};

use crate::message::Pop3Message;

/// Maps between session-local message numbers and unique identifiers.
///
/// The number to identifier mapping is a bijection. Every insertion updates
/// all maps at once, removing stale pairs on either side.
#[derive(Debug, Clone, Default)]
pub struct MessageIndex {
    by_uid: HashMap<String, Pop3Message>,
    number_by_uid: HashMap<String, u32>,
    uid_by_number: BTreeMap<u32, String>,
}

impl MessageIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uid_by_number.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uid_by_number.is_empty()
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.by_uid.clear();
        self.number_by_uid.clear();
        self.uid_by_number.clear();
    }

    /// Associates `number` with `uid`.
    ///
    /// A message already known under `uid` keeps its size and flags.
    pub fn insert(&mut self, number: u32, uid: &str) {
        tracing::trace!(uid, number, "indexing message");

        if let Some(old_uid) = self.uid_by_number.remove(&number) {
            if old_uid != uid {
                self.number_by_uid.remove(&old_uid);
                if let Some(message) = self.by_uid.get_mut(&old_uid) {
                    message.set_number(None);
                }
            }
        }
        if let Some(old_number) = self.number_by_uid.insert(uid.to_string(), number) {
            if old_number != number {
                self.uid_by_number.remove(&old_number);
            }
        }
        self.uid_by_number.insert(number, uid.to_string());

        self.by_uid
            .entry(uid.to_string())
            .or_insert_with(|| Pop3Message::new(uid))
            .set_number(Some(number));
    }

    /// Returns true if `number` has an identifier.
    #[must_use]
    pub fn contains_number(&self, number: u32) -> bool {
        self.uid_by_number.contains_key(&number)
    }

    /// Returns true if `uid` has a number.
    #[must_use]
    pub fn contains_uid(&self, uid: &str) -> bool {
        self.number_by_uid.contains_key(uid)
    }

    /// Message number for `uid`.
    #[must_use]
    pub fn number_of(&self, uid: &str) -> Option<u32> {
        self.number_by_uid.get(uid).copied()
    }

    /// Identifier for `number`.
    #[must_use]
    pub fn uid_of(&self, number: u32) -> Option<&str> {
        self.uid_by_number.get(&number).map(String::as_str)
    }

    /// Indexed message for `uid`.
    #[must_use]
    pub fn message(&self, uid: &str) -> Option<&Pop3Message> {
        self.by_uid.get(uid)
    }

    /// Indexed message for `number`.
    #[must_use]
    pub fn message_by_number(&self, number: u32) -> Option<&Pop3Message> {
        self.uid_of(number).and_then(|uid| self.by_uid.get(uid))
    }

    /// Records a fetched size on the indexed copy of a message.
    pub fn record_size(&mut self, uid: &str, size: u64) {
        if let Some(message) = self.by_uid.get_mut(uid) {
            message.set_size(size);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_populates_all_maps() {
        let mut index = MessageIndex::new();
        index.insert(3, "abc123");

        assert_eq!(index.number_of("abc123"), Some(3));
        assert_eq!(index.uid_of(3), Some("abc123"));
        assert_eq!(index.message("abc123").unwrap().number(), Some(3));
        assert_eq!(index.message_by_number(3).unwrap().uid(), "abc123");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_reinsert_keeps_bijection() {
        let mut index = MessageIndex::new();
        index.insert(1, "a");
        index.insert(2, "b");

        // After a reconnect "b" moved to number 1.
        index.insert(1, "b");

        assert_eq!(index.uid_of(1), Some("b"));
        assert_eq!(index.number_of("b"), Some(1));
        assert_eq!(index.number_of("a"), None);
        assert!(!index.contains_number(2));
        assert_eq!(index.len(), 1);
        assert_eq!(index.message("a").unwrap().number(), None);
    }

    #[test]
    fn test_record_size_survives_reindex() {
        let mut index = MessageIndex::new();
        index.insert(5, "x");
        index.record_size("x", 2048);
        index.insert(5, "x");

        assert_eq!(index.message("x").unwrap().size(), Some(2048));
    }

    #[test]
    fn test_clear() {
        let mut index = MessageIndex::new();
        index.insert(1, "a");
        index.clear();

        assert!(index.is_empty());
        assert!(!index.contains_uid("a"));
        assert!(index.message("a").is_none());
    }
}
