use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tickets::{Ticket, TicketId, TicketPriority, TicketStatus};

/// A case as Qube reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubeCase {
    pub case_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub qube_comments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub internal_ticket_id: TicketId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body sent when creating or updating a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasePayload {
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: String,
    pub tenant_id: String,
    pub property_id: Option<String>,
    pub metadata: CaseMetadata,
}

impl CasePayload {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            status: ticket.status,
            priority: ticket.priority,
            category: ticket.category.clone(),
            tenant_id: ticket.user_id.0.clone(),
            property_id: ticket.property_id.map(|id| id.to_string()),
            metadata: CaseMetadata {
                internal_ticket_id: ticket.id.clone(),
                created_at: ticket.created_at,
                updated_at: ticket.updated_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkUpdateRequest {
    pub case_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateSummary {
    pub message: String,
    pub updated_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReceipt {
    pub ticket_id: TicketId,
    pub case_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookEvent {
    pub event_type: String,
    #[serde(default)]
    pub case: Option<WebhookCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookCase {
    pub case_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub content: String,
    pub author: String,
}
