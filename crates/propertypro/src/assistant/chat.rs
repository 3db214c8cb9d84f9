use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::client::{CompletionRequest, LanguageModel, LlmError};
use crate::error::AppError;
use crate::http::ApiState;

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful property management assistant.";

#[derive(Debug, thiserror::Error)]
#[error("Error processing chat request: {0}")]
pub struct ChatError(#[from] pub LlmError);

fn chat_prompt(message: &str) -> String {
    format!(
        "You are a helpful property management assistant.\n\
         Answer the following question about property management, maintenance, or tenant services: {message}\n\
         Keep the response concise and informative."
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

pub struct ChatAssistant {
    llm: Arc<dyn LanguageModel>,
}

impl ChatAssistant {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn reply(&self, message: &str) -> Result<ChatReply, ChatError> {
        let request =
            CompletionRequest::new(CHAT_SYSTEM_PROMPT, chat_prompt(message)).max_tokens(150);
        let response = self.llm.complete(request).await?;
        Ok(ChatReply { response })
    }
}

pub fn router() -> Router<ApiState> {
    Router::new().route("/api/chat", post(chat_handler))
}

pub(crate) async fn chat_handler(
    State(assistant): State<Arc<ChatAssistant>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    Ok(Json(assistant.reply(&request.message).await?))
}
