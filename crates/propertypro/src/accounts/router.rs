use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::domain::{AccessToken, Credentials, NewUser, UserView};
use super::extract::CurrentUser;
use super::service::AccountService;
use crate::error::AppError;
use crate::http::ApiState;

/// Router builder exposing registration, login, and the current profile.
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/users/me", get(me_handler))
}

pub(crate) async fn register_handler(
    State(accounts): State<Arc<AccountService>>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

pub(crate) async fn login_handler(
    State(accounts): State<Arc<AccountService>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AccessToken>, AppError> {
    Ok(Json(accounts.login(credentials).await?))
}

pub(crate) async fn me_handler(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(user.view())
}
