use std::sync::Arc;

use chrono::{DateTime, Utc};
use mailparse::{MailAddr, MailHeaderMap, ParsedMail};
use serde::Serialize;
use tracing::{error, info, warn};

use super::classifier::{MailCategory, MailClassifier};
use super::inbox::{Mailbox, MailboxError, RawMessage};
use super::routing::DepartmentRoutes;
use super::transport::{MailError, MailTransport, OutboundEmail};
use crate::assistant::LlmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub subject: String,
    pub sender: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedEmail {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub category: MailCategory,
    pub processed_at: DateTime<Utc>,
}

/// Failure handling a single message; the scan moves on to the next one.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("unparseable message: {0}")]
    Parse(#[from] mailparse::MailParseError),
    #[error(transparent)]
    Classify(#[from] LlmError),
    #[error(transparent)]
    Forward(#[from] MailError),
}

/// Decodes subject, sender address, and the text/plain body of an RFC 822 message.
pub fn parse_message(raw: &[u8]) -> Result<ParsedEmail, mailparse::MailParseError> {
    let parsed = mailparse::parse_mail(raw)?;
    let subject = parsed
        .headers
        .get_first_value("Subject")
        .unwrap_or_default();
    let sender = parsed
        .headers
        .get_first_value("From")
        .map(|from| sender_address(&from))
        .unwrap_or_default();

    let mut parts = Vec::new();
    collect_plain_text(&parsed, &mut parts)?;

    Ok(ParsedEmail {
        subject,
        sender,
        body: parts.join(""),
    })
}

fn sender_address(from: &str) -> String {
    let Ok(addresses) = mailparse::addrparse(from) else {
        return from.trim().to_string();
    };
    addresses
        .iter()
        .find_map(|address| match address {
            MailAddr::Single(info) => Some(info.addr.clone()),
            MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
        })
        .unwrap_or_default()
}

fn collect_plain_text(
    part: &ParsedMail<'_>,
    out: &mut Vec<String>,
) -> Result<(), mailparse::MailParseError> {
    if part.subparts.is_empty() {
        if part.ctype.mimetype == "text/plain" {
            out.push(part.get_body()?);
        }
        return Ok(());
    }
    for sub in &part.subparts {
        collect_plain_text(sub, out)?;
    }
    Ok(())
}

/// Classifies unseen inbox mail and forwards it to department mailboxes.
pub struct InboxScanner {
    mailbox: Arc<dyn Mailbox>,
    classifier: MailClassifier,
    routes: DepartmentRoutes,
    mailer: Arc<dyn MailTransport>,
}

impl InboxScanner {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        classifier: MailClassifier,
        routes: DepartmentRoutes,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            mailbox,
            classifier,
            routes,
            mailer,
        }
    }

    /// One pass over the inbox. Only a mailbox failure aborts the pass.
    pub async fn scan_once(&self) -> Result<Vec<ProcessedEmail>, MailboxError> {
        let messages = self.mailbox.fetch_unseen().await?;
        let mut processed = Vec::with_capacity(messages.len());

        for message in messages {
            let id = message.id;
            match self.process(message).await {
                Ok(email) => processed.push(email),
                Err(err) => {
                    error!(message_id = id, error = %err, "skipping email");
                }
            }
        }

        info!(processed = processed.len(), "inbox scan finished");
        Ok(processed)
    }

    async fn process(&self, message: RawMessage) -> Result<ProcessedEmail, ScanError> {
        let email = parse_message(&message.rfc822)?;
        if email.body.trim().is_empty() {
            warn!(message_id = message.id, "email has no plain text body");
        }

        let classification = self.classifier.classify(&email.body).await?;
        let category = classification.category;
        let received = Utc::now();
        let to = self.routes.mailbox(category);

        let body = format!(
            "Original sender: {}\nCategory: {}\nReceived: {}\n\nOriginal message:\n{}",
            email.sender,
            category.as_str(),
            received.format("%Y-%m-%d %H:%M:%S"),
            email.body
        );
        let subject = format!("[{}] {}", category.as_str().to_uppercase(), email.subject);
        self.mailer
            .send(OutboundEmail::plain(to, subject, body))
            .await?;
        info!(message_id = message.id, category = category.as_str(), to, "forwarded email");

        Ok(ProcessedEmail {
            id: message.id.to_string(),
            subject: email.subject,
            sender: email.sender,
            category,
            processed_at: received,
        })
    }
}
