use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use super::domain::Ticket;
use crate::assistant::{CompletionRequest, LanguageModel};
use crate::policies::PolicySearch;

pub const FALLBACK_RESPONSE: &str = "Thank you for your ticket. Our team will review it shortly.";

const POLICY_MATCHES: usize = 3;

const SYSTEM_PROMPT: &str = "You are a helpful property management assistant. \
Generate a response based on the provided policies and user history. \
Be professional, empathetic, and solution-oriented.";

/// Drafts the first reply to a new ticket from policies and the tenant's history.
pub struct TicketResponder {
    llm: Arc<dyn LanguageModel>,
    policies: Arc<dyn PolicySearch>,
}

impl TicketResponder {
    pub fn new(llm: Arc<dyn LanguageModel>, policies: Arc<dyn PolicySearch>) -> Self {
        Self { llm, policies }
    }

    /// Never fails; model errors produce [`FALLBACK_RESPONSE`].
    pub async fn draft(&self, ticket: &Ticket, history: &[Ticket]) -> String {
        let policies: Vec<String> = self
            .policies
            .search(&ticket.description, POLICY_MATCHES)
            .into_iter()
            .map(|document| document.content)
            .collect();
        let recent: Vec<_> = history
            .iter()
            .map(|previous| json!({ "title": previous.title, "status": previous.status }))
            .collect();

        let context = format!(
            "Ticket Category: {}\nPriority: {}\n\nRelevant Policies:\n{}\n\nUser's Recent Tickets:\n{}",
            ticket.category,
            ticket.priority.as_str(),
            serde_json::to_string_pretty(&policies).unwrap_or_default(),
            serde_json::to_string_pretty(&recent).unwrap_or_default(),
        );
        let prompt = format!(
            "Context: {context}\n\nTicket: {}\n\nGenerate an appropriate response:",
            ticket.description
        );

        match self
            .llm
            .complete(CompletionRequest::new(SYSTEM_PROMPT, prompt))
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(ticket_id = %ticket.id, error = %err, "ticket reply generation failed");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}
