//! Example: list a POP3 mailbox and download the first lines of each message.
//!
//! ```bash
//! export POP3_HOST="pop.example.com"
//! export POP3_USER="user@example.com"
//! export POP3_PASSWORD="app-password"
//! RUST_LOG=mailfetch_pop3=debug cargo run --package mailfetch-pop3 --example list_inbox
//! ```

use std::env;

use mailfetch_pop3::{
    Config, FetchItem, FetchProfile, LoggingListener, NoopListener, Pop3Session, Security,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = env::var("POP3_HOST")?;
    let user = env::var("POP3_USER")?;
    let password = env::var("POP3_PASSWORD")?;

    let config = Config::builder(&host)
        .security(Security::TlsRequired)
        .credentials(user, password)
        .build();
    let mut session = Pop3Session::new(config);

    session.open().await?;
    let count = session.message_count();
    println!("{host}: {count} messages");
    if count == 0 {
        session.close().await;
        return Ok(());
    }

    let first = count.saturating_sub(9).max(1);
    let mut messages = session.get_messages(first, count, &mut NoopListener).await?;

    let profile = FetchProfile::new()
        .with(FetchItem::Envelope)
        .with(FetchItem::BodySane);
    session
        .fetch(&mut messages, &profile, &mut LoggingListener)
        .await?;

    for message in &messages {
        let subject = message
            .body()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .and_then(|text| {
                text.lines()
                    .find(|line| line.to_ascii_lowercase().starts_with("subject:"))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        println!(
            "{:>6} {:>8} {}  {subject}",
            message.number().unwrap_or_default(),
            message.size().unwrap_or_default(),
            message.uid(),
        );
    }

    session.close().await;
    Ok(())
}
