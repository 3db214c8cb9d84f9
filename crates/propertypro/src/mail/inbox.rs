use std::fmt::Display;
use std::io::{Read, Write};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::ImapConfig;

/// One unseen message as fetched from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: u32,
    pub rfc822: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("inbox is not configured: set EMAIL_ADDRESS and EMAIL_PASSWORD")]
    NotConfigured,
    #[error("tls setup failed: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("imap error: {0}")]
    Imap(#[from] imap::error::Error),
    #[error("inbox worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Source of unread mail.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Returns every unseen message; fetching marks them seen.
    async fn fetch_unseen(&self) -> Result<Vec<RawMessage>, MailboxError>;
}

/// IMAP-over-TLS inbox.
#[derive(Debug, Clone)]
pub struct ImapMailbox {
    server: String,
    port: u16,
    address: String,
    password: String,
}

impl ImapMailbox {
    pub fn new(config: &ImapConfig) -> Result<Self, MailboxError> {
        match (&config.address, &config.password) {
            (Some(address), Some(password)) => Ok(Self {
                server: config.server.clone(),
                port: config.port,
                address: address.clone(),
                password: password.clone(),
            }),
            _ => Err(MailboxError::NotConfigured),
        }
    }

    fn fetch_blocking(&self) -> Result<Vec<RawMessage>, MailboxError> {
        let tls = native_tls::TlsConnector::builder().build()?;
        let client = imap::connect((self.server.as_str(), self.port), &self.server, &tls)?;
        let mut session = client
            .login(&self.address, &self.password)
            .map_err(|(err, _client)| err)?;

        let messages = read_unseen(&mut session);
        if let Err(err) = session.logout() {
            warn!(server = %self.server, error = %err, "imap logout failed");
        }
        let messages = messages?;
        info!(server = %self.server, fetched = messages.len(), "inbox fetched");
        Ok(messages)
    }
}

fn read_unseen<T: Read + Write>(
    session: &mut imap::Session<T>,
) -> Result<Vec<RawMessage>, MailboxError> {
    session.select("INBOX")?;
    let mut ids: Vec<u32> = session.search("UNSEEN")?.into_iter().collect();
    ids.sort_unstable();
    debug!(count = ids.len(), "unseen messages");

    Ok(collect_messages(ids, |id| {
        let fetched = session.fetch(id.to_string(), "RFC822")?;
        let body = fetched
            .iter()
            .find_map(|message| message.body().map(<[u8]>::to_vec));
        Ok::<_, imap::error::Error>(body)
    }))
}

/// Fetches each id in turn; a failed or empty fetch is logged and skipped.
fn collect_messages<F, E>(ids: Vec<u32>, mut fetch_one: F) -> Vec<RawMessage>
where
    F: FnMut(u32) -> Result<Option<Vec<u8>>, E>,
    E: Display,
{
    let mut messages = Vec::with_capacity(ids.len());
    for id in ids {
        match fetch_one(id) {
            Ok(Some(rfc822)) => messages.push(RawMessage { id, rfc822 }),
            Ok(None) => warn!(message_id = id, "fetched message has no body"),
            Err(err) => warn!(message_id = id, error = %err, "skipping message that failed to fetch"),
        }
    }
    messages
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn fetch_unseen(&self) -> Result<Vec<RawMessage>, MailboxError> {
        let mailbox = self.clone();
        tokio::task::spawn_blocking(move || mailbox.fetch_blocking()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_credentials() {
        let err = ImapMailbox::new(&ImapConfig {
            server: "imap.example.com".to_string(),
            port: 993,
            address: Some("inbox@example.com".to_string()),
            password: None,
        })
        .expect_err("password missing");
        assert!(matches!(err, MailboxError::NotConfigured));
    }

    #[test]
    fn failed_fetch_skips_only_that_message() {
        let messages = collect_messages(vec![1, 2, 3, 4], |id| match id {
            2 => Err("connection reset"),
            3 => Ok(None),
            _ => Ok(Some(format!("Subject: message {id}\r\n\r\nbody").into_bytes())),
        });

        let ids: Vec<u32> = messages.iter().map(|message| message.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(messages[0].rfc822, b"Subject: message 1\r\n\r\nbody".to_vec());
    }
}
