use crate::accounts::AccountError;
use crate::assistant::{ChatError, LlmError};
use crate::config::ConfigError;
use crate::db::StoreError;
use crate::mail::{EmailPipelineError, MailError, MailboxError};
use crate::properties::PropertyError;
use crate::qube::{QubeError, QubeSyncError, WebhookError};
use crate::telemetry::TelemetryError;
use crate::tickets::TicketError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// A stored or submitted label that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Store(StoreError),
    Account(AccountError),
    Property(PropertyError),
    Ticket(TicketError),
    Llm(LlmError),
    Chat(ChatError),
    Email(EmailPipelineError),
    Mail(MailError),
    Mailbox(MailboxError),
    Qube(QubeSyncError),
    Validation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Account(err) => write!(f, "{}", err),
            AppError::Property(err) => write!(f, "{}", err),
            AppError::Ticket(err) => write!(f, "{}", err),
            AppError::Llm(err) => write!(f, "{}", err),
            AppError::Chat(err) => write!(f, "{}", err),
            AppError::Email(err) => write!(f, "{}", err),
            AppError::Mail(err) => write!(f, "{}", err),
            AppError::Mailbox(err) => write!(f, "{}", err),
            AppError::Qube(err) => write!(f, "{}", err),
            AppError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Account(err) => Some(err),
            AppError::Property(err) => Some(err),
            AppError::Ticket(err) => Some(err),
            AppError::Llm(err) => Some(err),
            AppError::Chat(err) => Some(err),
            AppError::Email(err) => Some(err),
            AppError::Mail(err) => Some(err),
            AppError::Mailbox(err) => Some(err),
            AppError::Qube(err) => Some(err),
            AppError::Validation(_) => None,
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Database(_) | StoreError::Io(_) | StoreError::Corrupt { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn account_status(err: &AccountError) -> StatusCode {
    match err {
        AccountError::EmailTaken | AccountError::InvalidEmail(_) | AccountError::EmptyPassword => {
            StatusCode::BAD_REQUEST
        }
        AccountError::InvalidCredentials
        | AccountError::MissingToken
        | AccountError::InvalidToken => StatusCode::UNAUTHORIZED,
        AccountError::Inactive | AccountError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        AccountError::Store(err) => store_status(err),
        AccountError::Password(_) | AccountError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn webhook_status(err: &WebhookError) -> StatusCode {
    match err {
        WebhookError::MissingSignature | WebhookError::InvalidSignature => {
            StatusCode::UNAUTHORIZED
        }
        WebhookError::Payload(_) | WebhookError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
        WebhookError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(err) => store_status(err),
            AppError::Account(err) => account_status(err),
            AppError::Property(err) => match err {
                PropertyError::Validation(_) => StatusCode::BAD_REQUEST,
                PropertyError::Forbidden(_) => StatusCode::FORBIDDEN,
                PropertyError::NotFound(_) => StatusCode::NOT_FOUND,
                PropertyError::Store(err) => store_status(err),
            },
            AppError::Ticket(err) => match err {
                TicketError::Validation(_) => StatusCode::BAD_REQUEST,
                TicketError::Forbidden(_) => StatusCode::FORBIDDEN,
                TicketError::NotFound(_) | TicketError::PropertyNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                TicketError::Store(err) => store_status(err),
            },
            AppError::Email(EmailPipelineError::Sender(_)) => StatusCode::BAD_REQUEST,
            AppError::Qube(err) => match err {
                QubeSyncError::TicketNotFound(_) => StatusCode::NOT_FOUND,
                QubeSyncError::Webhook(err) => webhook_status(err),
                QubeSyncError::Store(err) => store_status(err),
                QubeSyncError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Llm(_)
            | AppError::Chat(_)
            | AppError::Email(_)
            | AppError::Mail(_)
            | AppError::Mailbox(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(
            self,
            AppError::Account(
                AccountError::InvalidCredentials
                    | AccountError::MissingToken
                    | AccountError::InvalidToken
            )
        );

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<AccountError> for AppError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

impl From<PropertyError> for AppError {
    fn from(value: PropertyError) -> Self {
        Self::Property(value)
    }
}

impl From<TicketError> for AppError {
    fn from(value: TicketError) -> Self {
        Self::Ticket(value)
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        Self::Llm(value)
    }
}

impl From<ChatError> for AppError {
    fn from(value: ChatError) -> Self {
        Self::Chat(value)
    }
}

impl From<EmailPipelineError> for AppError {
    fn from(value: EmailPipelineError) -> Self {
        Self::Email(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

impl From<MailboxError> for AppError {
    fn from(value: MailboxError) -> Self {
        Self::Mailbox(value)
    }
}

impl From<QubeSyncError> for AppError {
    fn from(value: QubeSyncError) -> Self {
        Self::Qube(value)
    }
}

impl From<QubeError> for AppError {
    fn from(value: QubeError) -> Self {
        Self::Qube(QubeSyncError::Gateway(value))
    }
}
