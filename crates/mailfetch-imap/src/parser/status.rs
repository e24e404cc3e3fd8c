//! Reading a command's responses up to its tagged status.

use std::io::BufRead;

use super::ResponseParser;
use crate::error::{Error, Result};
use crate::handler::UntaggedHandler;
use crate::types::Response;

impl<R: BufRead> ResponseParser<R> {
    /// Reads responses until the tagged completion for `tag`.
    ///
    /// Untagged and continuation responses go to `handler` and are collected.
    /// Responses tagged for some other command are stale leftovers of an
    /// earlier exchange; they are logged and dropped. Tags compare without
    /// regard to ASCII case.
    ///
    /// On success, returns every collected response with the tagged one last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NegativeResponse`] if the tagged response is not `OK`,
    /// or any error from [`read_response`](Self::read_response).
    pub fn read_status_response(
        &mut self,
        tag: &str,
        handler: &mut dyn UntaggedHandler,
    ) -> Result<Vec<Response>> {
        let mut responses = Vec::new();

        loop {
            let response = self.read_response()?;

            match response.tag() {
                Some(other) if !other.eq_ignore_ascii_case(tag) => {
                    tracing::debug!(expected = tag, %response, "discarding stale tagged response");
                }
                Some(_) => {
                    let ok = response.get(0).is_some_and(|t| t.eq_ignore_case("OK"));
                    responses.push(response);
                    if ok {
                        return Ok(responses);
                    }
                    let rendered = responses.last().map(ToString::to_string).unwrap_or_default();
                    return Err(Error::NegativeResponse {
                        tag: tag.to_string(),
                        response: rendered,
                        responses,
                    });
                }
                None => {
                    handler.on_untagged(&response);
                    if let Some(alert) = response.alert_text() {
                        handler.on_alert(&alert);
                    }
                    responses.push(response);
                }
            }
        }
    }
}
