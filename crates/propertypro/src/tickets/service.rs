use std::sync::Arc;

use tracing::info;

use super::assist::TicketResponder;
use super::domain::{NewTicket, Ticket, TicketChange, TicketId, TicketStatus, TicketUpdate};
use super::notifications::{TicketEvent, TicketNotifier};
use super::repository::TicketRepository;
use crate::accounts::User;
use crate::db::{self, StoreError};
use crate::properties::{PropertyId, PropertyRepository};

const HISTORY_LIMIT: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Ticket not found")]
    NotFound(TicketId),
    #[error("Property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Service composing ticket storage, the reply drafter, and notifications.
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    properties: Arc<dyn PropertyRepository>,
    responder: TicketResponder,
    notifier: TicketNotifier,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        properties: Arc<dyn PropertyRepository>,
        responder: TicketResponder,
        notifier: TicketNotifier,
    ) -> Self {
        Self {
            tickets,
            properties,
            responder,
            notifier,
        }
    }

    pub async fn create(&self, actor: &User, draft: NewTicket) -> Result<Ticket, TicketError> {
        draft.validate().map_err(TicketError::Validation)?;
        if let Some(property_id) = draft.property_id {
            if self.properties.find(property_id).await?.is_none() {
                return Err(TicketError::PropertyNotFound(property_id));
            }
        }

        let now = db::now();
        let mut ticket = self
            .tickets
            .insert(Ticket {
                id: TicketId::generate(),
                title: draft.title.trim().to_string(),
                description: draft.description.trim().to_string(),
                category: draft.category.trim().to_string(),
                priority: draft.priority,
                status: TicketStatus::Open,
                ai_response: None,
                staff_response: None,
                user_id: actor.id.clone(),
                property_id: draft.property_id,
                qube_case_id: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(ticket_id = %ticket.id, user_id = %actor.id, "created ticket");

        let history = self
            .tickets
            .list_for_user(&actor.id, Some(HISTORY_LIMIT))
            .await?;
        ticket.ai_response = Some(self.responder.draft(&ticket, &history).await);
        self.tickets.update(&ticket).await?;

        self.notifier.notify(&ticket, &TicketEvent::Created).await;
        Ok(ticket)
    }

    /// Admins see every ticket, tenants only their own.
    pub async fn list(&self, actor: &User) -> Result<Vec<Ticket>, TicketError> {
        let tickets = if actor.is_admin() {
            self.tickets.list_all().await?
        } else {
            self.tickets.list_for_user(&actor.id, None).await?
        };
        Ok(tickets)
    }

    pub async fn get(&self, actor: &User, id: &TicketId) -> Result<Ticket, TicketError> {
        match self.tickets.find(id).await? {
            Some(ticket) if actor.is_admin() || ticket.user_id == actor.id => Ok(ticket),
            _ => Err(TicketError::NotFound(id.clone())),
        }
    }

    pub async fn update(
        &self,
        actor: &User,
        id: &TicketId,
        update: TicketUpdate,
    ) -> Result<Ticket, TicketError> {
        if !actor.is_admin() {
            return Err(TicketError::Forbidden(
                "Not authorized to update tickets".to_string(),
            ));
        }
        let mut ticket = self
            .tickets
            .find(id)
            .await?
            .ok_or_else(|| TicketError::NotFound(id.clone()))?;

        let change = update.apply(&mut ticket);
        let event = match change {
            TicketChange::Unchanged => return Ok(ticket),
            TicketChange::Closed => TicketEvent::Closed,
            TicketChange::Updated(update_type) => {
                let comment = match update_type {
                    "staff_response" => ticket.staff_response.clone(),
                    _ => None,
                };
                TicketEvent::updated(update_type, comment)
            }
        };

        ticket.updated_at = db::now();
        self.tickets.update(&ticket).await?;
        info!(ticket_id = %ticket.id, status = ticket.status.as_str(), "updated ticket");

        self.notifier.notify(&ticket, &event).await;
        Ok(ticket)
    }
}
