//! Language-model access and the public chat endpoint.

pub mod chat;
pub mod client;

pub use chat::{router, ChatAssistant, ChatError, ChatReply, ChatRequest};
pub use client::{ChatMessage, CompletionRequest, LanguageModel, LlmError, OpenAiChatClient};
