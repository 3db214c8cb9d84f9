use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox as Recipient;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Plain,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub format: BodyFormat,
}

impl OutboundEmail {
    pub fn plain(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            format: BodyFormat::Plain,
        }
    }

    pub fn html(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            format: BodyFormat::Html,
            ..Self::plain(to, subject, body)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("unable to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Outbound mail delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Parses an address and returns it lowercased.
pub fn normalize_address(raw: &str) -> Result<String, MailError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Address>()
        .map(|address| address.to_string().to_lowercase())
        .map_err(|err| MailError::InvalidAddress {
            address: trimmed.to_string(),
            reason: err.to_string(),
        })
}

fn recipient(raw: &str) -> Result<Recipient, MailError> {
    let address = raw
        .trim()
        .parse::<Address>()
        .map_err(|err| MailError::InvalidAddress {
            address: raw.trim().to_string(),
            reason: err.to_string(),
        })?;
    Ok(Recipient::new(None, address))
}

/// SMTP relay with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Recipient,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: recipient(&config.from_address)?,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let content_type = match email.format {
            BodyFormat::Plain => ContentType::TEXT_PLAIN,
            BodyFormat::Html => ContentType::TEXT_HTML,
        };
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient(&email.to)?)
            .subject(email.subject.as_str())
            .header(content_type)
            .body(email.body)?;

        self.transport.send(message).await?;
        info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}
