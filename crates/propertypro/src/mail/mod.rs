//! Inbound mail handling: classification, department routing, auto-replies,
//! and the polling inbox scanner.

pub mod classifier;
pub mod inbox;
pub mod responder;
pub mod router;
pub mod routing;
pub mod scanner;
pub mod transport;

pub use classifier::{Classification, MailCategory, MailClassifier};
pub use inbox::{ImapMailbox, Mailbox, MailboxError, RawMessage};
pub use responder::{EmailPipelineError, EmailReply, EmailResponder, InboundEmail};
pub use router::router;
pub use routing::DepartmentRoutes;
pub use scanner::{InboxScanner, ProcessedEmail, ScanError};
pub use transport::{normalize_address, BodyFormat, MailError, MailTransport, OutboundEmail, SmtpMailer};
