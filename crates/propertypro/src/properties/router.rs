use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::domain::{NewProperty, Property, PropertyId, PropertyUpdate};
use super::service::{PropertyService, DEFAULT_PAGE_SIZE};
use crate::accounts::CurrentUser;
use crate::error::AppError;
use crate::http::ApiState;

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/properties", get(list_handler).post(create_handler))
        .route("/properties/:id", get(get_handler).patch(update_handler))
}

pub(crate) async fn list_handler(
    State(properties): State<Arc<PropertyService>>,
    _user: CurrentUser,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Property>>, AppError> {
    Ok(Json(properties.list(page.skip, page.limit).await?))
}

pub(crate) async fn create_handler(
    State(properties): State<Arc<PropertyService>>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<NewProperty>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let property = properties.create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn get_handler(
    State(properties): State<Arc<PropertyService>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(properties.get(PropertyId(id)).await?))
}

pub(crate) async fn update_handler(
    State(properties): State<Arc<PropertyService>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<PropertyUpdate>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(properties.update(&user, PropertyId(id), update).await?))
}
