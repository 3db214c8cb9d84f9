use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::classifier::{Classification, MailClassifier};
use super::routing::DepartmentRoutes;
use super::transport::{normalize_address, MailError, MailTransport, OutboundEmail};
use crate::assistant::{CompletionRequest, LanguageModel, LlmError};

const REPLY_SYSTEM_PROMPT: &str = "You are a professional property management assistant. \
Generate a polite, helpful, and contextually appropriate email response. \
Keep the response concise but informative.";

#[derive(Debug, Clone, Deserialize)]
pub struct InboundEmail {
    pub sender_email: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub property_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReply {
    pub response: String,
    pub category: Classification,
    pub escalated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailPipelineError {
    #[error("invalid sender: {0}")]
    Sender(#[source] MailError),
    #[error("Error classifying email: {0}")]
    Classify(#[source] LlmError),
    #[error("Error generating email response: {0}")]
    Generate(#[source] LlmError),
    #[error("Error sending email: {0}")]
    Send(#[source] MailError),
}

/// Classify, answer, and escalate a single email.
pub struct EmailResponder {
    llm: Arc<dyn LanguageModel>,
    classifier: MailClassifier,
    routes: DepartmentRoutes,
    mailer: Arc<dyn MailTransport>,
}

impl EmailResponder {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        routes: DepartmentRoutes,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            classifier: MailClassifier::new(llm.clone()),
            llm,
            routes,
            mailer,
        }
    }

    pub async fn respond(&self, email: InboundEmail) -> Result<EmailReply, EmailPipelineError> {
        let sender = normalize_address(&email.sender_email).map_err(EmailPipelineError::Sender)?;

        let classification = self
            .classifier
            .classify(&email.content)
            .await
            .map_err(EmailPipelineError::Classify)?;
        let response = self
            .generate_reply(&email, &classification)
            .await
            .map_err(EmailPipelineError::Generate)?;

        let escalated = classification.should_escalate();
        if escalated {
            let department = self.routes.mailbox(classification.category);
            let body = format!(
                "Original email from: {}\nCategory: {}\nPriority: {}\nContent: {}",
                sender,
                classification.category.as_str(),
                classification.priority.as_str(),
                email.content
            );
            self.mailer
                .send(OutboundEmail::plain(
                    department,
                    format!("Escalated: {}", email.subject),
                    body,
                ))
                .await
                .map_err(EmailPipelineError::Send)?;
            info!(category = classification.category.as_str(), to = department, "escalated email");
        }

        self.mailer
            .send(OutboundEmail::plain(
                sender.as_str(),
                format!("Re: {}", email.subject),
                response.clone(),
            ))
            .await
            .map_err(EmailPipelineError::Send)?;

        Ok(EmailReply {
            response,
            category: classification,
            escalated,
        })
    }

    async fn generate_reply(
        &self,
        email: &InboundEmail,
        classification: &Classification,
    ) -> Result<String, LlmError> {
        let context = format!(
            "Category: {}\nDepartment: {}\nPriority: {}\nProperty ID: {}",
            classification.category.as_str(),
            classification.department,
            classification.priority.as_str(),
            email.property_id.as_deref().unwrap_or("Not specified")
        );
        let prompt = format!(
            "Context: {context}\n\nOriginal email: {}\n\nGenerate an appropriate response:",
            email.content
        );
        self.llm
            .complete(CompletionRequest::new(REPLY_SYSTEM_PROMPT, prompt))
            .await
    }
}
