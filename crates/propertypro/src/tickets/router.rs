use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::domain::{NewTicket, Ticket, TicketId, TicketUpdate};
use super::service::TicketService;
use crate::accounts::CurrentUser;
use crate::error::AppError;
use crate::http::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/tickets", get(list_handler).post(create_handler))
        .route("/tickets/:ticket_id", get(get_handler).patch(update_handler))
}

pub(crate) async fn create_handler(
    State(tickets): State<Arc<TicketService>>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = tickets.create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub(crate) async fn list_handler(
    State(tickets): State<Arc<TicketService>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Ticket>>, AppError> {
    Ok(Json(tickets.list(&user).await?))
}

pub(crate) async fn get_handler(
    State(tickets): State<Arc<TicketService>>,
    CurrentUser(user): CurrentUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(tickets.get(&user, &TicketId(ticket_id)).await?))
}

pub(crate) async fn update_handler(
    State(tickets): State<Arc<TicketService>>,
    CurrentUser(user): CurrentUser,
    Path(ticket_id): Path<String>,
    Json(update): Json<TicketUpdate>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(
        tickets.update(&user, &TicketId(ticket_id), update).await?,
    ))
}
