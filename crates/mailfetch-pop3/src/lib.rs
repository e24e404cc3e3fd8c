//! # mailfetch-pop3
//!
//! An async POP3 retrieval engine (RFC 1939, RFC 2449).
//!
//! ## Features
//!
//! - **Connection security**: plain, `STLS` upgrade (optional or required) and
//!   implicit TLS, with strict or permissive certificate checks
//! - **Authentication**: `USER`/`PASS`, `AUTH PLAIN`, `AUTH CRAM-MD5` and `APOP`
//! - **Capability probing**: `CAPA` once per connection, with a live `TOP`
//!   probe for servers that cannot list their capabilities
//! - **Size-aware indexing**: per-message `UIDL`/`LIST` on huge mailboxes,
//!   bulk listings otherwise
//! - **Delete emulation**: the `Deleted` flag maps to `DELE`
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailfetch_pop3::{Config, FetchItem, FetchProfile, NoopListener, Pop3Session};
//!
//! #[tokio::main]
//! async fn main() -> mailfetch_pop3::Result<()> {
//!     let config = Config::new("pop.example.com", "user@example.com", "password");
//!     let mut session = Pop3Session::new(config);
//!
//!     session.open().await?;
//!     let count = session.message_count();
//!     let mut messages = session.get_messages(1, count, &mut NoopListener).await?;
//!
//!     let profile = FetchProfile::new()
//!         .with(FetchItem::Envelope)
//!         .with(FetchItem::BodySane);
//!     session.fetch(&mut messages, &profile, &mut NoopListener).await?;
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌────────┐  open()  ┌───────────┐  STLS?  ┌──────────┐  auth + STAT  ┌───────┐
//! │ Closed │ ───────→ │ Connected │ ──────→ │ Upgraded │ ────────────→ │ Ready │
//! └────────┘          └───────────┘         └──────────┘               └───────┘
//!      ↑                                                                   │
//!      └──────────────── close() or transport failure ─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: POP3 command builders
//! - [`connection`]: Sockets, TLS trust and the line-oriented stream

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
mod body;
mod capability;
pub mod command;
mod config;
pub mod connection;
mod error;
mod index;
mod listener;
mod message;
mod session;

pub use body::{BodyParser, HeaderCheckParser, RawBodyParser};
pub use capability::Capabilities;
pub use config::{AuthType, Config, ConfigBuilder, Security};
pub use connection::{SocketFactory, TlsSocketFactory, TrustContext};
pub use error::{BoxError, Error, Result};
pub use index::MessageIndex;
pub use listener::{CollectingListener, LoggingListener, NoopListener, RetrievalListener};
pub use message::{FetchItem, FetchProfile, Flag, Pop3Message};
pub use session::Pop3Session;
