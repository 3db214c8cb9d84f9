//! Case synchronisation with the external Qube case-management service.

pub mod client;
pub mod domain;
pub mod router;
pub mod sync;
pub mod webhook;

pub use client::{CaseGateway, QubeClient, QubeError};
pub use domain::{
    BulkUpdateRequest, BulkUpdateSummary, CaseMetadata, CasePayload, CommentRequest, NewComment,
    QubeCase, SyncReceipt, WebhookAck, WebhookCase, WebhookEvent,
};
pub use router::router;
pub use sync::{QubeSyncError, QubeSyncService};
pub use webhook::{WebhookError, WebhookVerifier, SIGNATURE_HEADER};

#[cfg(test)]
mod tests;
