use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::{CaseGateway, QubeError};
use super::domain::{
    BulkUpdateRequest, BulkUpdateSummary, CasePayload, NewComment, QubeCase, SyncReceipt,
    WebhookAck, WebhookEvent,
};
use super::webhook::{WebhookError, WebhookVerifier};
use crate::accounts::User;
use crate::db::{self, StoreError};
use crate::properties::{PropertyId, PropertyRepository};
use crate::tickets::{Ticket, TicketId, TicketRepository, TicketStatus};

#[derive(Debug, thiserror::Error)]
pub enum QubeSyncError {
    #[error("Ticket not found")]
    TicketNotFound(TicketId),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] QubeError),
}

/// Keeps local tickets and Qube cases in step.
pub struct QubeSyncService {
    tickets: Arc<dyn TicketRepository>,
    properties: Arc<dyn PropertyRepository>,
    cases: Arc<dyn CaseGateway>,
    verifier: WebhookVerifier,
}

impl QubeSyncService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        properties: Arc<dyn PropertyRepository>,
        cases: Arc<dyn CaseGateway>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            tickets,
            properties,
            cases,
            verifier,
        }
    }

    pub async fn sync_ticket(&self, id: &TicketId) -> Result<SyncReceipt, QubeSyncError> {
        let mut ticket = self
            .tickets
            .find(id)
            .await?
            .ok_or_else(|| QubeSyncError::TicketNotFound(id.clone()))?;
        let case_id = self.push(&mut ticket).await?;
        Ok(SyncReceipt {
            ticket_id: ticket.id,
            case_id,
        })
    }

    async fn push(&self, ticket: &mut Ticket) -> Result<String, QubeSyncError> {
        let payload = CasePayload::from_ticket(ticket);
        let case_id = self
            .cases
            .upsert_case(&payload, ticket.qube_case_id.as_deref())
            .await?;
        if ticket.qube_case_id.as_deref() != Some(case_id.as_str()) {
            ticket.qube_case_id = Some(case_id.clone());
            self.tickets.update(ticket).await?;
        }
        Ok(case_id)
    }

    pub async fn bulk_update(
        &self,
        request: BulkUpdateRequest,
    ) -> Result<BulkUpdateSummary, QubeSyncError> {
        let mut tickets = self.tickets.find_by_case_ids(&request.case_ids).await?;
        for ticket in &mut tickets {
            if let Some(status) = request.status {
                ticket.status = status;
            }
            if let Some(priority) = request.priority {
                ticket.priority = priority;
            }
            ticket.updated_at = db::now();
        }

        // Qube first; local rows change only once every case accepted the update.
        for ticket in &mut tickets {
            let payload = CasePayload::from_ticket(ticket);
            let case_id = self
                .cases
                .upsert_case(&payload, ticket.qube_case_id.as_deref())
                .await?;
            ticket.qube_case_id = Some(case_id);
        }
        self.tickets.update_many(&tickets).await?;

        info!(
            requested = request.case_ids.len(),
            updated = tickets.len(),
            "bulk updated qube cases"
        );
        Ok(BulkUpdateSummary {
            message: "Bulk update successful".to_string(),
            updated_count: tickets.len(),
        })
    }

    /// Verifies and applies a webhook delivery. Events other than
    /// `case.updated` are acknowledged without effect.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, QubeSyncError> {
        self.verifier.verify(body, signature)?;
        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|err| WebhookError::Payload(err.to_string()))?;

        if event.event_type != "case.updated" {
            debug!(event_type = %event.event_type, "ignoring qube webhook event");
            return Ok(WebhookAck::success());
        }

        let case = event
            .case
            .ok_or_else(|| WebhookError::Payload("case.updated without case".to_string()))?;
        let status = case
            .status
            .as_deref()
            .ok_or_else(|| WebhookError::Payload("case.updated without status".to_string()))?
            .parse::<TicketStatus>()
            .map_err(WebhookError::from)?;

        match self.tickets.find_by_case_id(&case.case_id).await? {
            Some(mut ticket) => {
                ticket.status = status;
                ticket.updated_at = db::now();
                self.tickets.update(&ticket).await?;
                info!(ticket_id = %ticket.id, case_id = %case.case_id, status = status.as_str(), "applied qube case update");
            }
            None => {
                warn!(case_id = %case.case_id, "qube case is not linked to a ticket");
            }
        }
        Ok(WebhookAck::success())
    }

    /// Cases for the properties `owner` owns.
    pub async fn cases_for_owner(&self, owner: &User) -> Result<Vec<QubeCase>, QubeSyncError> {
        let property_ids: Vec<PropertyId> = self
            .properties
            .list_by_owner(&owner.id)
            .await?
            .into_iter()
            .map(|property| property.id)
            .collect();
        Ok(self.cases.list_cases(&property_ids).await?)
    }

    pub async fn case(&self, case_id: &str) -> Result<QubeCase, QubeSyncError> {
        Ok(self.cases.get_case(case_id).await?)
    }

    pub async fn comment(
        &self,
        case_id: &str,
        content: String,
        author: &User,
    ) -> Result<serde_json::Value, QubeSyncError> {
        let comment = NewComment {
            content,
            author: author.full_name.clone(),
        };
        Ok(self.cases.add_comment(case_id, &comment).await?)
    }
}
