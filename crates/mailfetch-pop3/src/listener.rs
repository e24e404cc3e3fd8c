//! Progress callbacks for message retrieval.
//!
//! # Example
//!
//! ```
//! use mailfetch_pop3::{Pop3Message, RetrievalListener};
//!
//! struct Progress {
//!     done: usize,
//! }
//!
//! impl RetrievalListener for Progress {
//!     fn message_finished(&mut self, _message: &Pop3Message, _index: usize, _total: usize) {
//!         self.done += 1;
//!     }
//! }
//! ```

use crate::message::Pop3Message;

/// Receives per-message progress from listing and fetch operations.
pub trait RetrievalListener: Send {
    /// Called before a message is processed.
    fn message_started(&mut self, uid: &str, index: usize, total: usize) {
        let _ = (uid, index, total);
    }

    /// Called once a message has been processed.
    fn message_finished(&mut self, message: &Pop3Message, index: usize, total: usize) {
        let _ = (message, index, total);
    }
}

/// A listener that ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RetrievalListener for NoopListener {}

/// A listener that logs progress using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl RetrievalListener for LoggingListener {
    fn message_started(&mut self, uid: &str, index: usize, total: usize) {
        tracing::debug!(uid, index, total, "message started");
    }

    fn message_finished(&mut self, message: &Pop3Message, index: usize, total: usize) {
        tracing::debug!(
            uid = message.uid(),
            size = message.size(),
            index,
            total,
            "message finished"
        );
    }
}

/// A listener that records identifiers in callback order.
#[derive(Debug, Default, Clone)]
pub struct CollectingListener {
    /// Identifiers passed to `message_started`.
    pub started: Vec<String>,
    /// Identifiers passed to `message_finished`.
    pub finished: Vec<String>,
}

impl CollectingListener {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetrievalListener for CollectingListener {
    fn message_started(&mut self, uid: &str, _index: usize, _total: usize) {
        self.started.push(uid.to_string());
    }

    fn message_finished(&mut self, message: &Pop3Message, _index: usize, _total: usize) {
        self.finished.push(message.uid().to_string());
    }
}
