use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::UserId;
use crate::error::UnknownValue;
use crate::properties::PropertyId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }
}

impl FromStr for TicketPriority {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(UnknownValue::new("ticket priority", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    Pending,
    InProgress,
    Completed,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::Closed => "closed",
        }
    }

    /// Statuses still waiting on staff.
    pub const AWAITING_STAFF: [TicketStatus; 2] = [TicketStatus::Open, TicketStatus::Pending];
}

impl FromStr for TicketStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "in_progress" | "in-progress" => Ok(TicketStatus::InProgress),
            "completed" => Ok(TicketStatus::Completed),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(UnknownValue::new("ticket status", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub ai_response: Option<String>,
    pub staff_response: Option<String>,
    pub user_id: UserId,
    pub property_id: Option<PropertyId>,
    pub qube_case_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub property_id: Option<PropertyId>,
}

impl NewTicket {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub staff_response: Option<String>,
}

/// What an applied update actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketChange {
    Unchanged,
    Closed,
    Updated(&'static str),
}

impl TicketUpdate {
    /// Applies the update in place and reports the most significant change.
    pub fn apply(self, ticket: &mut Ticket) -> TicketChange {
        let mut change = TicketChange::Unchanged;

        if let Some(response) = self.staff_response {
            if ticket.staff_response.as_deref() != Some(response.as_str()) {
                ticket.staff_response = Some(response);
                change = TicketChange::Updated("staff_response");
            }
        }
        if let Some(priority) = self.priority {
            if ticket.priority != priority {
                ticket.priority = priority;
                change = TicketChange::Updated("priority_change");
            }
        }
        if let Some(status) = self.status {
            if ticket.status != status {
                ticket.status = status;
                change = if status == TicketStatus::Closed {
                    TicketChange::Closed
                } else {
                    TicketChange::Updated("status_change")
                };
            }
        }
        change
    }
}
