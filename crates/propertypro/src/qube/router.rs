use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{BulkUpdateRequest, BulkUpdateSummary, CommentRequest, QubeCase, SyncReceipt, WebhookAck};
use super::sync::QubeSyncService;
use super::webhook::SIGNATURE_HEADER;
use crate::accounts::CurrentUser;
use crate::error::AppError;
use crate::http::ApiState;
use crate::tickets::TicketId;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/api/qube/webhook", post(webhook_handler))
        .route("/api/qube/cases", get(list_cases_handler))
        .route("/api/qube/cases/bulk-update", post(bulk_update_handler))
        .route("/api/qube/cases/:case_id", get(case_handler))
        .route("/api/qube/cases/:case_id/comments", post(comment_handler))
        .route("/api/qube/tickets/:ticket_id/sync", post(sync_handler))
}

pub(crate) async fn webhook_handler(
    State(qube): State<Arc<QubeSyncService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    Ok(Json(qube.handle_webhook(&body, signature).await?))
}

pub(crate) async fn list_cases_handler(
    State(qube): State<Arc<QubeSyncService>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<QubeCase>>, AppError> {
    Ok(Json(qube.cases_for_owner(&user).await?))
}

pub(crate) async fn case_handler(
    State(qube): State<Arc<QubeSyncService>>,
    _user: CurrentUser,
    Path(case_id): Path<String>,
) -> Result<Json<QubeCase>, AppError> {
    Ok(Json(qube.case(&case_id).await?))
}

pub(crate) async fn comment_handler(
    State(qube): State<Arc<QubeSyncService>>,
    CurrentUser(user): CurrentUser,
    Path(case_id): Path<String>,
    Json(comment): Json<CommentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if comment.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    Ok(Json(qube.comment(&case_id, comment.content, &user).await?))
}

pub(crate) async fn bulk_update_handler(
    State(qube): State<Arc<QubeSyncService>>,
    user: CurrentUser,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateSummary>, AppError> {
    user.require_admin("update cases")?;
    Ok(Json(qube.bulk_update(request).await?))
}

pub(crate) async fn sync_handler(
    State(qube): State<Arc<QubeSyncService>>,
    user: CurrentUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<SyncReceipt>, AppError> {
    user.require_admin("sync tickets")?;
    Ok(Json(qube.sync_ticket(&TicketId(ticket_id)).await?))
}
