//! POP3 retrieval session.
//!
//! A [`Pop3Session`] owns one connection and the message index built over it.
//! Every operation that talks to the server opens the session first, so a
//! caller can go straight to [`Pop3Session::fetch`] without calling
//! [`Pop3Session::open`]. Sessions are driven through `&mut self`; share one
//! between tasks only behind a mutex.

use std::collections::{HashMap, HashSet};
use std::fmt;

use bytes::Bytes;

use crate::auth;
use crate::body::{BodyParser, RawBodyParser};
use crate::capability::Capabilities;
use crate::command::Command;
use crate::config::{AuthType, Config, Security};
use crate::connection::{Pop3Stream, SocketFactory, TlsSocketFactory};
use crate::error::{Error, Result};
use crate::index::MessageIndex;
use crate::listener::RetrievalListener;
use crate::message::{FetchItem, FetchProfile, Flag, Pop3Message};

/// Requests for fewer messages than this may be served one command each.
const SMALL_REQUEST: usize = 50;

/// Mailboxes with more messages than this are too large to list casually.
const LARGE_MAILBOX: u32 = 5000;

/// An authenticated connection.
struct Connection {
    stream: Pop3Stream,
    capabilities: Capabilities,
    greeting: String,
}

enum State {
    Closed,
    Ready(Box<Connection>),
}

/// A POP3 mailbox session.
pub struct Pop3Session<F: SocketFactory = TlsSocketFactory> {
    config: Config,
    factory: F,
    state: State,
    index: MessageIndex,
    message_count: u32,
    body_parser: Box<dyn BodyParser>,
}

impl Pop3Session {
    /// Creates a closed session using TCP sockets and webpki trust roots.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_factory(config, TlsSocketFactory::default())
    }
}

impl<F: SocketFactory> Pop3Session<F> {
    /// Creates a closed session that obtains its sockets from `factory`.
    #[must_use]
    pub fn with_factory(config: Config, factory: F) -> Self {
        Self {
            config,
            factory,
            state: State::Closed,
            index: MessageIndex::new(),
            message_count: 0,
            body_parser: Box::new(RawBodyParser),
        }
    }

    /// Replaces the parser used for downloaded message content.
    #[must_use]
    pub fn with_body_parser(mut self, parser: impl BodyParser + 'static) -> Self {
        self.body_parser = Box::new(parser);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true if the session is connected and authenticated.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Capabilities of the current connection, if open.
    #[must_use]
    pub fn capabilities(&self) -> Option<&Capabilities> {
        match &self.state {
            State::Ready(conn) => Some(&conn.capabilities),
            State::Closed => None,
        }
    }

    /// Server greeting of the current connection, if open.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        match &self.state {
            State::Ready(conn) => Some(&conn.greeting),
            State::Closed => None,
        }
    }

    /// Number of messages reported by `STAT` when the session was opened.
    #[must_use]
    pub const fn message_count(&self) -> u32 {
        self.message_count
    }

    /// The number/identifier index of this session.
    #[must_use]
    pub const fn index(&self) -> &MessageIndex {
        &self.index
    }

    /// Returns the indexed message for `uid`, or a fresh unindexed one.
    #[must_use]
    pub fn get_message(&self, uid: &str) -> Pop3Message {
        self.index
            .message(uid)
            .cloned()
            .unwrap_or_else(|| Pop3Message::new(uid))
    }

    /// Connects, authenticates and reads the message count.
    ///
    /// Does nothing if the session is already open. Opening clears the
    /// index since message numbers are only valid within one connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TlsUnavailable`] if `STLS` is required but not
    /// offered, [`Error::Authentication`] if the credentials are rejected or
    /// the exchange fails, or a transport error.
    pub async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let (connection, count) = self.connect().await?;
        tracing::debug!(host = %self.config.host, messages = count, "POP3 session ready");

        self.index.clear();
        self.message_count = count;
        self.state = State::Ready(Box::new(connection));
        Ok(())
    }

    async fn connect(&self) -> Result<(Connection, u32)> {
        let security = self.config.security;
        let transport = self
            .factory
            .connect(
                &self.config.host,
                self.config.port,
                security.is_implicit_tls(),
                security.is_strict(),
                self.config.connect_timeout,
            )
            .await?;
        let mut stream = Pop3Stream::new(transport, self.config.io_timeout);

        let greeting = stream.execute(None).await?;
        let capabilities = probe_capabilities(&mut stream).await?;

        if matches!(
            security,
            Security::StartTlsOptional | Security::StartTlsRequired
        ) {
            if capabilities.stls {
                stream.execute(Some(&Command::Stls)).await?;
                let upgraded = self
                    .factory
                    .upgrade(stream.into_inner(), &self.config.host, security.is_strict())
                    .await?;
                stream = Pop3Stream::new(upgraded, self.config.io_timeout);
            } else if security == Security::StartTlsRequired {
                return Err(Error::TlsUnavailable);
            } else {
                tracing::warn!(host = %self.config.host, "STLS not offered, continuing unencrypted");
            }
        }

        self.authenticate(&mut stream, &capabilities, &greeting)
            .await?;

        let status = stream.execute(Some(&Command::Stat)).await?;
        let count = parse_stat(&status)?;

        Ok((
            Connection {
                stream,
                capabilities,
                greeting,
            },
            count,
        ))
    }

    async fn authenticate(
        &self,
        stream: &mut Pop3Stream,
        capabilities: &Capabilities,
        greeting: &str,
    ) -> Result<()> {
        let username = self.config.username.as_str();
        let password = self.config.password.as_str();

        match self.config.auth_type {
            AuthType::Plain if capabilities.sasl_plain => auth_plain(stream, username, password)
                .await
                .map_err(|e| Error::authentication("AUTH PLAIN failed", e)),
            AuthType::Plain => login(stream, username, password)
                .await
                .map_err(|e| Error::authentication("USER/PASS failed", e)),
            AuthType::CramMd5 if capabilities.sasl_cram_md5 => {
                auth_cram_md5(stream, username, password)
                    .await
                    .map_err(|e| Error::authentication("AUTH CRAM-MD5 failed", e))
            }
            AuthType::CramMd5 | AuthType::Apop => {
                let Some(timestamp) = auth::apop_timestamp(greeting) else {
                    return Err(Error::Authentication {
                        message: "APOP is not supported: greeting has no timestamp".to_string(),
                        source: None,
                    });
                };
                let command = Command::Apop {
                    username: username.to_string(),
                    digest: auth::apop_digest(timestamp, password),
                };
                stream
                    .execute(Some(&command))
                    .await
                    .map(drop)
                    .map_err(|e| Error::authentication("APOP failed", e))
            }
        }
    }

    /// Sends `QUIT` and closes the connection.
    ///
    /// Failures are logged and ignored; the session is closed afterwards in
    /// any case.
    pub async fn close(&mut self) {
        if let State::Ready(conn) = &mut self.state {
            if let Err(e) = conn.stream.execute(Some(&Command::Quit)).await {
                tracing::debug!(error = %e, "QUIT failed");
            }
        }
        self.close_io().await;
    }

    async fn close_io(&mut self) {
        if let State::Ready(mut conn) = std::mem::replace(&mut self.state, State::Closed) {
            if let Err(e) = conn.stream.shutdown().await {
                tracing::debug!(error = %e, "ignoring shutdown failure");
            }
        }
    }

    /// Opens a session, checks that identifier listings work, and closes it.
    ///
    /// Servers that do not advertise `UIDL` are asked for the listing anyway,
    /// since retrieval cannot work without it.
    ///
    /// # Errors
    ///
    /// Returns the error that made the check fail.
    pub async fn check_settings(&mut self) -> Result<()> {
        let result = self.verify_uidl().await;
        self.close().await;
        result
    }

    async fn verify_uidl(&mut self) -> Result<()> {
        self.open().await?;
        if !self.capabilities().is_some_and(|caps| caps.uidl) {
            self.listing(&Command::Uidl(None)).await?;
        }
        Ok(())
    }

    /// Returns the messages numbered `start..=end`, in order.
    ///
    /// Numbers without an identifier (gaps left by deletions) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `start < 1` or `end < start`, or
    /// the error of the identifier listing.
    pub async fn get_messages(
        &mut self,
        start: u32,
        end: u32,
        listener: &mut dyn RetrievalListener,
    ) -> Result<Vec<Pop3Message>> {
        if start < 1 || end < start {
            return Err(Error::InvalidRange { start, end });
        }

        self.open().await?;
        self.index_numbers(start, end).await?;

        let total = usize::try_from(end - start).map_or(usize::MAX, |n| n.saturating_add(1));
        let mut messages = Vec::new();
        for number in start..=end {
            let Some(message) = self.index.message_by_number(number) else {
                continue;
            };
            let position = messages.len();
            listener.message_started(message.uid(), position, total);
            listener.message_finished(message, position, total);
            messages.push(message.clone());
        }
        Ok(messages)
    }

    /// Downloads what `profile` asks for into `messages`.
    ///
    /// - [`FetchItem::Envelope`] fills in message sizes.
    /// - [`FetchItem::Body`] downloads whole messages with `RETR`.
    /// - [`FetchItem::BodySane`] downloads the first lines with `TOP`,
    ///   falling back to `RETR` if the server cannot do it.
    /// - [`FetchItem::Structure`] clears the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] for identifiers the server does not
    /// list, [`Error::BodyParse`] if a whole message cannot be parsed, or a
    /// server or transport error.
    pub async fn fetch(
        &mut self,
        messages: &mut [Pop3Message],
        profile: &FetchProfile,
        listener: &mut dyn RetrievalListener,
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        self.open().await?;
        let uids: Vec<String> = messages.iter().map(|m| m.uid().to_string()).collect();
        self.index_uids(&uids).await?;

        let envelope_only = profile.is_envelope_only();
        if profile.contains(FetchItem::Envelope) {
            self.fetch_envelope(messages, listener, envelope_only).await?;
        }

        let total = messages.len();
        for (position, message) in messages.iter_mut().enumerate() {
            if !profile.contains(FetchItem::Envelope) {
                listener.message_started(message.uid(), position, total);
            }

            if profile.contains(FetchItem::Body) {
                self.fetch_body(message, false).await?;
            } else if profile.contains(FetchItem::BodySane) {
                self.fetch_body(message, true).await?;
            } else if profile.contains(FetchItem::Structure) {
                message.set_body(None);
            }

            if !envelope_only {
                listener.message_finished(message, position, total);
            }
        }
        Ok(())
    }

    async fn fetch_envelope(
        &mut self,
        messages: &mut [Pop3Message],
        listener: &mut dyn RetrievalListener,
        notify: bool,
    ) -> Result<()> {
        let missing_sizes = messages.iter().filter(|m| m.size().is_none()).count();
        if missing_sizes == 0 {
            return Ok(());
        }

        let total = messages.len();
        if missing_sizes < SMALL_REQUEST && self.message_count > LARGE_MAILBOX {
            for (position, message) in messages.iter_mut().enumerate() {
                if notify {
                    listener.message_started(message.uid(), position, total);
                }
                let number = self.number_of(message.uid())?;
                let line = self.execute(&Command::List(Some(number))).await?;
                let size = parse_list_response(&line)?;
                self.apply_size(message, number, size);
                if notify {
                    listener.message_finished(message, position, total);
                }
            }
            return Ok(());
        }

        let positions: HashMap<String, usize> = messages
            .iter()
            .enumerate()
            .map(|(position, message)| (message.uid().to_string(), position))
            .collect();

        let lines = self.listing(&Command::List(None)).await?;
        let mut done = 0;
        for line in &lines {
            let Some((number, size)) = parse_list_line(line) else {
                tracing::debug!(line, "skipping malformed LIST line");
                continue;
            };
            let Some(uid) = self.index.uid_of(number).map(str::to_string) else {
                continue;
            };
            let Some(&position) = positions.get(&uid) else {
                continue;
            };

            let message = &mut messages[position];
            if notify {
                listener.message_started(message.uid(), done, total);
            }
            self.apply_size(message, number, size);
            if notify {
                listener.message_finished(message, done, total);
            }
            done += 1;
        }
        Ok(())
    }

    fn apply_size(&mut self, message: &mut Pop3Message, number: u32, size: u64) {
        message.set_number(Some(number));
        message.set_size(size);
        self.index.record_size(message.uid(), size);
    }

    /// Downloads one body. A `partial` request is truncated with `TOP` when
    /// the size budget allows and tolerates content the parser rejects.
    async fn fetch_body(&mut self, message: &mut Pop3Message, partial: bool) -> Result<()> {
        let number = self.number_of(message.uid())?;
        let capabilities = self.connection_mut()?.capabilities;
        let lines = (partial && self.config.max_download_size > 0)
            .then(|| self.config.partial_fetch_lines());

        let mut truncated = false;
        if let Some(lines) = lines.filter(|_| capabilities.may_use_top()) {
            if !capabilities.top {
                tracing::debug!("TOP not advertised, trying it anyway");
            }
            match self.execute(&Command::Top { number, lines }).await {
                Ok(_) => {
                    self.connection_mut()?.capabilities.top = true;
                    truncated = true;
                }
                Err(Error::Server(response)) if !capabilities.top => {
                    tracing::debug!(%response, "TOP rejected, using RETR for this session");
                    self.connection_mut()?.capabilities.top_not_supported = true;
                }
                Err(e) => return Err(e),
            }
        }

        if !truncated {
            self.execute(&Command::Retr(number)).await?;
        }
        let content = self.read_body().await?;

        match self.body_parser.parse(message, content, truncated) {
            Ok(()) => {
                if !truncated {
                    message.set_flag(Flag::DownloadedFull, true);
                }
                Ok(())
            }
            Err(e) if partial => {
                tracing::warn!(uid = message.uid(), error = %e, "ignoring unparseable partial download");
                Ok(())
            }
            Err(e) => Err(Error::BodyParse(e)),
        }
    }

    /// Applies `flags` to `messages` on the server.
    ///
    /// Only setting [`Flag::Deleted`] has an effect: each message is marked
    /// with `DELE` right away, in the order given. All identifiers are
    /// resolved before anything is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if an identifier has no message
    /// number, or a server or transport error.
    pub async fn set_flags(
        &mut self,
        messages: &[Pop3Message],
        flags: &[Flag],
        value: bool,
    ) -> Result<()> {
        if !value || !flags.contains(&Flag::Deleted) {
            return Ok(());
        }

        self.open().await?;
        let uids: Vec<String> = messages.iter().map(|m| m.uid().to_string()).collect();
        self.index_uids(&uids).await?;

        let numbers = uids
            .iter()
            .map(|uid| self.number_of(uid))
            .collect::<Result<Vec<_>>>()?;
        for number in numbers {
            self.execute(&Command::Dele(number)).await?;
        }
        Ok(())
    }

    /// Marks `messages` deleted on the server.
    ///
    /// # Errors
    ///
    /// See [`Pop3Session::set_flags`].
    pub async fn delete(&mut self, messages: &[Pop3Message]) -> Result<()> {
        self.set_flags(messages, &[Flag::Deleted], true).await
    }

    /// Makes sure numbers `start..=end` have identifiers.
    async fn index_numbers(&mut self, start: u32, end: u32) -> Result<()> {
        let unindexed = (start..=end)
            .filter(|&number| !self.index.contains_number(number))
            .count();
        if unindexed == 0 {
            return Ok(());
        }

        if unindexed < SMALL_REQUEST && self.message_count > LARGE_MAILBOX {
            for number in start..=end {
                if self.index.contains_number(number) {
                    continue;
                }
                let line = self.execute(&Command::Uidl(Some(number))).await?;
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 || parts[0] != "+OK" {
                    tracing::warn!(number, %line, "unexpected UIDL response, stopping");
                    return Ok(());
                }
                self.index.insert(number, parts[2]);
            }
            return Ok(());
        }

        let lines = self.listing(&Command::Uidl(None)).await?;
        for line in &lines {
            match parse_uidl_line(line) {
                Some((number, uid)) if (start..=end).contains(&number) => {
                    self.index.insert(number, uid);
                }
                Some(_) => {}
                None => tracing::debug!(line, "skipping malformed UIDL line"),
            }
        }
        Ok(())
    }

    /// Makes sure `uids` have numbers, as far as the server knows them.
    ///
    /// Only a full listing can map identifiers to numbers.
    async fn index_uids(&mut self, uids: &[String]) -> Result<()> {
        let missing: HashSet<&str> = uids
            .iter()
            .map(String::as_str)
            .filter(|uid| !self.index.contains_uid(uid))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let lines = self.listing(&Command::Uidl(None)).await?;
        for line in &lines {
            let Some((number, uid)) = parse_uidl_line(line) else {
                tracing::debug!(line, "skipping malformed UIDL line");
                continue;
            };
            if missing.contains(uid) {
                self.index.insert(number, uid);
            }
        }
        Ok(())
    }

    fn number_of(&self, uid: &str) -> Result<u32> {
        self.index
            .number_of(uid)
            .ok_or_else(|| Error::MessageNotFound(uid.to_string()))
    }

    fn connection_mut(&mut self) -> Result<&mut Connection> {
        match &mut self.state {
            State::Ready(conn) => Ok(conn.as_mut()),
            State::Closed => Err(Error::NotConnected),
        }
    }

    async fn execute(&mut self, command: &Command) -> Result<String> {
        let result = match self.connection_mut() {
            Ok(conn) => conn.stream.execute(Some(command)).await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    async fn listing(&mut self, command: &Command) -> Result<Vec<String>> {
        self.execute(command).await?;
        let result = match self.connection_mut() {
            Ok(conn) => conn.stream.read_listing().await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    async fn read_body(&mut self) -> Result<Bytes> {
        let result = match self.connection_mut() {
            Ok(conn) => conn.stream.read_body().await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    /// Drops the connection if `result` failed at the transport level.
    async fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.as_ref().is_err_and(Error::is_transport) {
            tracing::debug!("transport failure, closing connection");
            self.close_io().await;
        }
        result
    }
}

impl<F: SocketFactory> fmt::Debug for Pop3Session<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pop3Session")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("message_count", &self.message_count)
            .field("indexed", &self.index.len())
            .finish_non_exhaustive()
    }
}

async fn probe_capabilities(stream: &mut Pop3Stream) -> Result<Capabilities> {
    match stream.execute(Some(&Command::Capa)).await {
        Ok(_) => {
            let lines = stream.read_listing().await?;
            Ok(Capabilities::from_lines(lines.iter().map(String::as_str)))
        }
        Err(Error::Server(response)) => {
            tracing::debug!(%response, "CAPA not supported");
            Ok(Capabilities::unknown())
        }
        Err(e) => Err(e),
    }
}

async fn login(stream: &mut Pop3Stream, username: &str, password: &str) -> Result<()> {
    stream
        .execute(Some(&Command::User(username.to_string())))
        .await?;
    stream
        .execute(Some(&Command::Pass(password.to_string())))
        .await?;
    Ok(())
}

async fn auth_plain(stream: &mut Pop3Stream, username: &str, password: &str) -> Result<()> {
    stream
        .execute(Some(&Command::Auth("PLAIN".to_string())))
        .await?;
    let response = auth::plain_response(username, password);
    stream
        .execute(Some(&Command::AuthResponse(response)))
        .await?;
    Ok(())
}

async fn auth_cram_md5(stream: &mut Pop3Stream, username: &str, password: &str) -> Result<()> {
    let line = stream
        .execute(Some(&Command::Auth("CRAM-MD5".to_string())))
        .await?;
    let challenge = line.strip_prefix('+').unwrap_or(&line).trim_start();
    let response = auth::cram_md5_response(challenge, username, password)?;
    stream
        .execute(Some(&Command::AuthResponse(response)))
        .await?;
    Ok(())
}

fn parse_stat(line: &str) -> Result<u32> {
    line.split_whitespace()
        .nth(1)
        .and_then(|count| count.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("Unexpected STAT response: {line}")))
}

/// Parses `+OK <number> <size>`.
fn parse_list_response(line: &str) -> Result<u64> {
    line.split_whitespace()
        .nth(2)
        .and_then(|size| size.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("Unexpected LIST response: {line}")))
}

/// Parses a `<number> <size>` listing line.
fn parse_list_line(line: &str) -> Option<(u32, u64)> {
    let mut parts = line.split_whitespace();
    let number = parts.next()?.parse().ok()?;
    let size = parts.next()?.parse().ok()?;
    Some((number, size))
}

/// Parses a `<number> <uid>` listing line.
///
/// Some servers prefix every line with `+OK`; that prefix is dropped.
fn parse_uidl_line(line: &str) -> Option<(u32, &str)> {
    let mut parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() >= 3 && parts[0] == "+OK" {
        parts.remove(0);
    }
    if parts.len() < 2 {
        return None;
    }
    let number = parts[0].parse().ok()?;
    Some((number, parts[1]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uidl_line() {
        assert_eq!(parse_uidl_line("1 abc"), Some((1, "abc")));
        assert_eq!(parse_uidl_line("2   def  "), Some((2, "def")));
        assert_eq!(parse_uidl_line("+OK 3 abc123"), Some((3, "abc123")));
        assert_eq!(parse_uidl_line("+OK 3"), None);
        assert_eq!(parse_uidl_line("7"), None);
        assert_eq!(parse_uidl_line("x abc"), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list_line("4 1200"), Some((4, 1200)));
        assert_eq!(parse_list_line("4"), None);
        assert_eq!(parse_list_response("+OK 4 1200").unwrap(), 1200);
        assert!(parse_list_response("+OK").is_err());
    }

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat("+OK 12 48213").unwrap(), 12);
        assert!(matches!(parse_stat("+OK"), Err(Error::Protocol(_))));
    }
}
