//! # mailfetch-core
//!
//! Storage side of mailfetch.
//!
//! This crate provides:
//! - A lock-guarded store running units of work under a read or write lock,
//!   optionally transactional, with nesting made explicit by scope values
//! - The local copy of a POP3 mailbox
//! - Synchronization of that copy with a server

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod mailbox;
pub mod store;
pub mod sync;

pub use error::{BoxError, Error, Result};
pub use mailbox::{MailboxState, StoredMessage};
pub use store::{LockMode, LockableStore, NestedScope, WorkScope};
pub use sync::{SyncOptions, SyncReport, sync_mailbox};
