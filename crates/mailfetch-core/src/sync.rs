//! Downloading new messages into a [`MailboxState`].
//!
//! One pass over the server listing, recording what arrives. Retrying is
//! left to the caller.

use std::collections::HashSet;

use mailfetch_pop3::{
    FetchItem, FetchProfile, Flag, NoopListener, Pop3Message, Pop3Session, RetrievalListener,
    SocketFactory,
};

use crate::error::Result;
use crate::mailbox::MailboxState;
use crate::store::LockableStore;

/// What a sync downloads and whether it leaves messages on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Download whole messages instead of the configured size budget.
    pub full_bodies: bool,
    /// Delete fully downloaded messages from the server afterwards.
    pub delete_after_download: bool,
}

/// Outcome of one sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Messages on the server.
    pub listed: usize,
    /// Messages downloaded in this run.
    pub downloaded: usize,
    /// Messages deleted from the server.
    pub deleted: usize,
    /// Stored messages dropped because the server no longer lists them.
    pub forgotten: usize,
}

/// Downloads messages not yet in `store`.
///
/// Each message is recorded in its own transaction right after its body
/// arrives. The store lock is only taken between protocol exchanges, never
/// while waiting on the server.
///
/// # Errors
///
/// Returns the first POP3 or store failure. Messages stored before the
/// failure stay stored.
pub async fn sync_mailbox<F: SocketFactory>(
    session: &mut Pop3Session<F>,
    store: &LockableStore<MailboxState>,
    options: SyncOptions,
    listener: &mut dyn RetrievalListener,
) -> Result<SyncReport> {
    session.open().await?;
    let count = session.message_count();
    let listed = if count == 0 {
        Vec::new()
    } else {
        session.get_messages(1, count, &mut NoopListener).await?
    };

    let uids: HashSet<&str> = listed.iter().map(Pop3Message::uid).collect();
    let forgotten = store
        .transaction(|state| Ok(state.retain_listed(&uids)))
        .await?;

    let mut fresh: Vec<Pop3Message> = store
        .read(|state| {
            Ok(listed
                .iter()
                .filter(|message| !state.contains(message.uid()))
                .cloned()
                .collect())
        })
        .await?;
    tracing::info!(
        listed = listed.len(),
        fresh = fresh.len(),
        forgotten,
        "mailbox listed"
    );

    session
        .fetch(
            &mut fresh,
            &FetchProfile::new().with(FetchItem::Envelope),
            &mut NoopListener,
        )
        .await?;

    let body = FetchProfile::new().with(if options.full_bodies {
        FetchItem::Body
    } else {
        FetchItem::BodySane
    });
    for message in &mut fresh {
        session
            .fetch(std::slice::from_mut(message), &body, listener)
            .await?;
        store
            .transaction(|state| {
                state.record(message);
                Ok(())
            })
            .await?;
    }

    let mut deleted = 0;
    if options.delete_after_download {
        let complete: Vec<Pop3Message> = fresh
            .iter()
            .filter(|message| message.has_flag(Flag::DownloadedFull))
            .cloned()
            .collect();
        session.delete(&complete).await?;
        deleted = complete.len();
    }

    Ok(SyncReport {
        listed: listed.len(),
        downloaded: fresh.len(),
        deleted,
        forgotten,
    })
}
