use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::Ticket;
use crate::accounts::UserRepository;
use crate::db::StoreError;
use crate::mail::{MailTransport, OutboundEmail};
use crate::properties::PropertyRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketEvent {
    Created,
    Updated {
        update_type: String,
        comment: Option<String>,
    },
    Closed,
}

impl TicketEvent {
    pub fn updated(update_type: impl Into<String>, comment: Option<String>) -> Self {
        Self::Updated {
            update_type: update_type.into(),
            comment,
        }
    }
}

/// Emails the tenant and the property owner about ticket lifecycle events.
pub struct TicketNotifier {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    mailer: Arc<dyn MailTransport>,
}

impl TicketNotifier {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            users,
            properties,
            mailer,
        }
    }

    /// Delivery problems are logged, never returned.
    pub async fn notify(&self, ticket: &Ticket, event: &TicketEvent) {
        let recipients = match self.recipients(ticket).await {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(ticket_id = %ticket.id, error = %err, "could not resolve notification recipients");
                return;
            }
        };
        if recipients.is_empty() {
            debug!(ticket_id = %ticket.id, "no notification recipients");
            return;
        }

        let (subject, body) = render(ticket, event);
        for to in recipients {
            let email = OutboundEmail::html(to.as_str(), subject.as_str(), body.as_str());
            if let Err(err) = self.mailer.send(email).await {
                warn!(ticket_id = %ticket.id, to = %to, error = %err, "ticket notification failed");
            }
        }
    }

    async fn recipients(&self, ticket: &Ticket) -> Result<Vec<String>, StoreError> {
        let Some(tenant) = self.users.find_by_id(&ticket.user_id).await? else {
            return Ok(Vec::new());
        };
        let mut recipients = vec![tenant.email];

        let Some(property_id) = ticket.property_id else {
            return Ok(recipients);
        };
        let owner_id = self
            .properties
            .find(property_id)
            .await?
            .and_then(|property| property.owner_id);
        if let Some(owner_id) = owner_id {
            if let Some(owner) = self.users.find_by_id(&owner_id).await? {
                if !recipients.contains(&owner.email) {
                    recipients.push(owner.email);
                }
            }
        }
        Ok(recipients)
    }
}

fn render(ticket: &Ticket, event: &TicketEvent) -> (String, String) {
    let id = escape(&ticket.id.0);
    let title = escape(&ticket.title);
    match event {
        TicketEvent::Created => (
            format!("New Support Case Created: {}", ticket.title),
            format!(
                "<html><body>\
                 <h2>New Support Case Created</h2>\
                 <p><strong>Case ID:</strong> {id}</p>\
                 <p><strong>Title:</strong> {title}</p>\
                 <p><strong>Description:</strong> {}</p>\
                 <p><strong>Priority:</strong> {}</p>\
                 <p><strong>Category:</strong> {}</p>\
                 <p>You can view and respond to this case in your dashboard.</p>\
                 </body></html>",
                escape(&ticket.description),
                ticket.priority.as_str(),
                escape(&ticket.category),
            ),
        ),
        TicketEvent::Updated {
            update_type,
            comment,
        } => {
            let comment = comment
                .as_deref()
                .map(|comment| format!("<p><strong>New Comment:</strong> {}</p>", escape(comment)))
                .unwrap_or_default();
            (
                format!("Case Updated: {}", ticket.title),
                format!(
                    "<html><body>\
                     <h2>Case Update Notification</h2>\
                     <p><strong>Case ID:</strong> {id}</p>\
                     <p><strong>Title:</strong> {title}</p>\
                     <p><strong>Update Type:</strong> {}</p>\
                     <p><strong>New Status:</strong> {}</p>\
                     <p><strong>New Priority:</strong> {}</p>\
                     {comment}\
                     <p>You can view the full details in your dashboard.</p>\
                     </body></html>",
                    escape(update_type),
                    ticket.status.as_str(),
                    ticket.priority.as_str(),
                ),
            )
        }
        TicketEvent::Closed => (
            format!("Case Closed: {}", ticket.title),
            format!(
                "<html><body>\
                 <h2>Case Closed</h2>\
                 <p><strong>Case ID:</strong> {id}</p>\
                 <p><strong>Title:</strong> {title}</p>\
                 <p><strong>Resolution:</strong> {}</p>\
                 <p>Thank you for using our support system. If you have any further questions, please don't hesitate to create a new case.</p>\
                 </body></html>",
                escape(
                    ticket
                        .staff_response
                        .as_deref()
                        .unwrap_or("No resolution provided")
                ),
            ),
        ),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
