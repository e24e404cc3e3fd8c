//! Handlers for untagged responses read while waiting for a command status.
//!
//! Servers may send untagged data at any time, and a command's real payload
//! (e.g. `* 1 FETCH ...`) arrives untagged before its tagged completion.
//! [`ResponseParser::read_status_response`](crate::ResponseParser::read_status_response)
//! passes each one to an [`UntaggedHandler`] as it is read.
//!
//! # Example
//!
//! ```
//! use mailfetch_imap::{Response, UntaggedHandler};
//!
//! struct ExistsCounter {
//!     exists: Option<u32>,
//! }
//!
//! impl UntaggedHandler for ExistsCounter {
//!     fn on_untagged(&mut self, response: &Response) {
//!         if response.get(1).is_some_and(|t| t.eq_ignore_case("EXISTS")) {
//!             self.exists = response.get_number(0).ok();
//!         }
//!     }
//! }
//! ```

use crate::types::Response;

/// Receives untagged and continuation responses.
pub trait UntaggedHandler {
    /// Called for each untagged or continuation response, in arrival order.
    fn on_untagged(&mut self, response: &Response);

    /// Called when a response carries an `[ALERT]` code.
    ///
    /// Alerts are meant to be shown to the user.
    fn on_alert(&mut self, text: &str) {
        let _ = text;
    }
}

impl<F> UntaggedHandler for F
where
    F: FnMut(&Response),
{
    fn on_untagged(&mut self, response: &Response) {
        self(response);
    }
}

/// A handler that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl UntaggedHandler for NoopHandler {
    fn on_untagged(&mut self, _response: &Response) {}
}

/// A handler that logs responses using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl UntaggedHandler for LoggingHandler {
    fn on_untagged(&mut self, response: &Response) {
        tracing::debug!(%response, "untagged response");
    }

    fn on_alert(&mut self, text: &str) {
        tracing::warn!(text, "server alert");
    }
}

/// A handler that keeps copies of everything it sees.
///
/// Mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    /// Untagged responses in arrival order.
    pub responses: Vec<Response>,
    /// Alert texts in arrival order.
    pub alerts: Vec<String>,
}

impl CollectingHandler {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UntaggedHandler for CollectingHandler {
    fn on_untagged(&mut self, response: &Response) {
        self.responses.push(response.clone());
    }

    fn on_alert(&mut self, text: &str) {
        self.alerts.push(text.to_string());
    }
}
