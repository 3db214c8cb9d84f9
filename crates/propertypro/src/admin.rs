//! Dashboard counters for administrators.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::accounts::{CurrentUser, Role, UserRepository};
use crate::db::StoreError;
use crate::error::AppError;
use crate::http::ApiState;
use crate::properties::PropertyRepository;
use crate::tickets::{TicketRepository, TicketStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_properties: i64,
    pub total_tenants: i64,
    pub pending_tickets: i64,
}

pub struct AdminStatsService {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl AdminStatsService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        tickets: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            users,
            properties,
            tickets,
        }
    }

    pub async fn stats(&self) -> Result<AdminStats, StoreError> {
        Ok(AdminStats {
            total_properties: self.properties.count().await?,
            total_tenants: self.users.count_by_role(Role::Tenant).await?,
            pending_tickets: self
                .tickets
                .count_with_status(&TicketStatus::AWAITING_STAFF)
                .await?,
        })
    }
}

pub fn router() -> Router<ApiState> {
    Router::new().route("/admin/stats", get(stats_handler))
}

pub(crate) async fn stats_handler(
    State(admin): State<Arc<AdminStatsService>>,
    user: CurrentUser,
) -> Result<Json<AdminStats>, AppError> {
    user.require_admin("access admin stats")?;
    Ok(Json(admin.stats().await?))
}
