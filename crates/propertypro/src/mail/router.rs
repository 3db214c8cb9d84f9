use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use super::responder::{EmailReply, EmailResponder, InboundEmail};
use crate::accounts::CurrentUser;
use crate::error::AppError;
use crate::http::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new().route("/api/email/respond", post(respond_handler))
}

pub(crate) async fn respond_handler(
    State(responder): State<Arc<EmailResponder>>,
    user: CurrentUser,
    Json(email): Json<InboundEmail>,
) -> Result<Json<EmailReply>, AppError> {
    user.require_admin("process emails")?;
    Ok(Json(responder.respond(email).await?))
}
