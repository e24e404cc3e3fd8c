//! Integration tests for mailbox synchronization.
//!
//! A scripted in-memory stream plays the POP3 server.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailfetch_core::{LockableStore, MailboxState, SyncOptions, sync_mailbox};
use mailfetch_pop3::connection::BoxedStream;
use mailfetch_pop3::{
    CollectingListener, Config, Error as Pop3Error, Pop3Message, Pop3Session, Security,
    SocketFactory,
};

/// Mock stream that returns predefined responses.
struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Serves one scripted stream.
struct ScriptedServer {
    stream: Mutex<Option<MockStream>>,
}

impl SocketFactory for ScriptedServer {
    async fn connect(
        &self,
        _host: &str,
        _port: u16,
        _tls: bool,
        _strict: bool,
        _timeout: Duration,
    ) -> mailfetch_pop3::Result<BoxedStream> {
        self.stream
            .lock()
            .unwrap()
            .take()
            .map(|stream| Box::new(stream) as BoxedStream)
            .ok_or_else(|| Pop3Error::Io(io::ErrorKind::ConnectionRefused.into()))
    }

    async fn upgrade(
        &self,
        stream: BoxedStream,
        _host: &str,
        _strict: bool,
    ) -> mailfetch_pop3::Result<BoxedStream> {
        Ok(stream)
    }
}

fn session(responses: &str) -> (Pop3Session<ScriptedServer>, Arc<Mutex<Vec<u8>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let server = ScriptedServer {
        stream: Mutex::new(Some(MockStream {
            responses: Cursor::new(responses.as_bytes().to_vec()),
            sent: Arc::clone(&sent),
        })),
    };
    let config = Config::builder("pop.test")
        .security(Security::None)
        .credentials("user", "secret")
        .build();
    (Pop3Session::with_factory(config, server), sent)
}

fn sent_lines(sent: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    String::from_utf8_lossy(&sent.lock().unwrap())
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

const LOGIN: &str = "+OK ready\r\n+OK\r\nTOP\r\nUIDL\r\nUSER\r\n.\r\n+OK\r\n+OK\r\n";

#[tokio::test]
async fn test_sync_downloads_only_new_messages() {
    let script = format!(
        "{LOGIN}+OK 2 300\r\n\
         +OK\r\n1 aaa\r\n2 bbb\r\n.\r\n\
         +OK\r\n2 200\r\n.\r\n\
         +OK\r\nSubject: b\r\n\r\nbody\r\n.\r\n"
    );
    let (mut session, sent) = session(&script);

    let mut state = MailboxState::new();
    state.record(&Pop3Message::new("aaa"));
    state.record(&Pop3Message::new("gone"));
    let store = LockableStore::new(state);

    let options = SyncOptions {
        full_bodies: true,
        delete_after_download: false,
    };
    let mut listener = CollectingListener::new();
    let report = sync_mailbox(&mut session, &store, options, &mut listener)
        .await
        .unwrap();

    assert_eq!(report.listed, 2);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.forgotten, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(listener.finished, vec!["bbb"]);

    let state = store.into_inner();
    assert!(state.contains("aaa"));
    assert!(!state.contains("gone"));
    let stored = state.get("bbb").unwrap();
    assert!(stored.complete);
    assert_eq!(stored.size, Some(200));
    assert!(sent_lines(&sent).contains(&"RETR 2".to_string()));
}

#[tokio::test]
async fn test_sync_deletes_complete_downloads() {
    let script = format!(
        "{LOGIN}+OK 1 100\r\n\
         +OK\r\n1 aaa\r\n.\r\n\
         +OK\r\n1 100\r\n.\r\n\
         +OK\r\nSubject: a\r\n\r\nbody\r\n.\r\n\
         +OK deleted\r\n"
    );
    let (mut session, sent) = session(&script);
    let store = LockableStore::new(MailboxState::new());

    let options = SyncOptions {
        full_bodies: true,
        delete_after_download: true,
    };
    let report = sync_mailbox(&mut session, &store, options, &mut CollectingListener::new())
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(sent_lines(&sent).last().map(String::as_str), Some("DELE 1"));
    assert!(store.into_inner().contains("aaa"));
}

#[tokio::test]
async fn test_sync_keeps_messages_stored_before_failure() {
    let script = format!(
        "{LOGIN}+OK 2 300\r\n\
         +OK\r\n1 aaa\r\n2 bbb\r\n.\r\n\
         +OK\r\n1 100\r\n2 200\r\n.\r\n\
         +OK\r\nSubject: a\r\n\r\nbody\r\n.\r\n\
         -ERR gone\r\n"
    );
    let (mut session, sent) = session(&script);
    let store = LockableStore::new(MailboxState::new());

    let options = SyncOptions {
        full_bodies: true,
        delete_after_download: true,
    };
    let result = sync_mailbox(&mut session, &store, options, &mut CollectingListener::new()).await;

    assert!(result.is_err());
    let lines = sent_lines(&sent);
    assert_eq!(lines.last().map(String::as_str), Some("RETR 2"));
    assert!(!lines.iter().any(|line| line.starts_with("DELE")));

    let state = store.into_inner();
    let stored = state.get("aaa").unwrap();
    assert!(stored.complete);
    assert_eq!(stored.size, Some(100));
    assert!(!state.contains("bbb"));
}

#[tokio::test]
async fn test_sync_empty_mailbox() {
    let (mut session, sent) = session(&format!("{LOGIN}+OK 0 0\r\n"));
    let store = LockableStore::new(MailboxState::new());

    let report = sync_mailbox(
        &mut session,
        &store,
        SyncOptions::default(),
        &mut CollectingListener::new(),
    )
    .await
    .unwrap();

    assert_eq!(report, mailfetch_core::SyncReport::default());
    assert_eq!(sent_lines(&sent).last().map(String::as_str), Some("STAT"));
}
