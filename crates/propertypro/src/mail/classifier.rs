use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::assistant::{CompletionRequest, LanguageModel, LlmError};
use crate::tickets::TicketPriority;

/// Confidence attached to every model classification.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MailCategory {
    Complaint,
    RentIssue,
    ServiceRequest,
    Legal,
    Praise,
    GeneralInquiry,
}

impl MailCategory {
    pub const ALL: [MailCategory; 6] = [
        MailCategory::Complaint,
        MailCategory::RentIssue,
        MailCategory::ServiceRequest,
        MailCategory::Legal,
        MailCategory::Praise,
        MailCategory::GeneralInquiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MailCategory::Complaint => "complaint",
            MailCategory::RentIssue => "rent_issue",
            MailCategory::ServiceRequest => "service_request",
            MailCategory::Legal => "legal",
            MailCategory::Praise => "praise",
            MailCategory::GeneralInquiry => "general_inquiry",
        }
    }

    pub fn department(&self) -> &'static str {
        match self {
            MailCategory::Complaint | MailCategory::Praise => "Customer Service",
            MailCategory::RentIssue => "Finance",
            MailCategory::ServiceRequest => "Maintenance",
            MailCategory::Legal => "Legal",
            MailCategory::GeneralInquiry => "General Support",
        }
    }

    pub fn priority(&self) -> TicketPriority {
        match self {
            MailCategory::Complaint | MailCategory::RentIssue | MailCategory::Legal => {
                TicketPriority::High
            }
            MailCategory::ServiceRequest => TicketPriority::Medium,
            MailCategory::Praise | MailCategory::GeneralInquiry => TicketPriority::Low,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            MailCategory::Complaint => "Customer complaints and dissatisfaction",
            MailCategory::RentIssue => "Rent payment issues and queries",
            MailCategory::ServiceRequest => "Maintenance and repair requests",
            MailCategory::Legal => "Legal notices, disputes and lease enforcement",
            MailCategory::Praise => "Compliments and positive feedback",
            MailCategory::GeneralInquiry => "General questions and information requests",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: MailCategory,
    pub confidence: f64,
    pub department: String,
    pub priority: TicketPriority,
}

impl Classification {
    pub fn new(category: MailCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence,
            department: category.department().to_string(),
            priority: category.priority(),
        }
    }

    /// High-priority mail the model is sure about, or anything it is unsure
    /// about, goes to a human.
    pub fn should_escalate(&self) -> bool {
        (self.priority == TicketPriority::High && self.confidence > 0.7) || self.confidence < 0.5
    }
}

/// Reads the category out of a model reply: a JSON `category` field when the
/// reply is JSON, otherwise its first word. Unknown labels are general
/// inquiries.
pub fn parse_category(reply: &str) -> MailCategory {
    let label = json_object(reply)
        .and_then(|object| serde_json::from_str::<serde_json::Value>(object).ok())
        .and_then(|value| {
            value
                .get("category")
                .and_then(|category| category.as_str())
                .map(str::to_string)
        })
        .or_else(|| reply.split_whitespace().next().map(str::to_string))
        .unwrap_or_default();

    let label = label
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
        .to_lowercase();
    MailCategory::from_label(&label).unwrap_or(MailCategory::GeneralInquiry)
}

// Models often wrap JSON in prose or code fences.
fn json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

pub struct MailClassifier {
    llm: Arc<dyn LanguageModel>,
}

impl MailClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, content: &str) -> Result<Classification, LlmError> {
        let catalogue = MailCategory::ALL
            .iter()
            .map(|category| format!("- {}: {}", category.as_str(), category.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Classify the following email into one of these categories:\n{catalogue}\n\n\
             Email content: {content}\n\n\
             Provide the classification in JSON format with category, confidence score (0-1), and explanation."
        );

        let request = CompletionRequest::new("You are an email classification expert.", prompt)
            .temperature(0.3)
            .max_tokens(150);
        let reply = self.llm.complete(request).await?;
        let category = parse_category(&reply);
        debug!(category = category.as_str(), "classified email");
        Ok(Classification::new(category, DEFAULT_CONFIDENCE))
    }
}
