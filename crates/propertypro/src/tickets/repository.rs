use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::domain::{Ticket, TicketId, TicketStatus};
use crate::accounts::UserId;
use crate::db::{self, SqliteStore, StoreError};
use crate::properties::PropertyId;

/// Storage abstraction for support tickets. Listings are newest first.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket, StoreError>;
    async fn update(&self, ticket: &Ticket) -> Result<(), StoreError>;
    /// Writes every ticket or none of them.
    async fn update_many(&self, tickets: &[Ticket]) -> Result<(), StoreError>;
    async fn find(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError>;
    async fn list_all(&self) -> Result<Vec<Ticket>, StoreError>;
    async fn list_for_user(
        &self,
        user: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Ticket>, StoreError>;
    async fn find_by_case_id(&self, case_id: &str) -> Result<Option<Ticket>, StoreError>;
    async fn find_by_case_ids(&self, case_ids: &[String]) -> Result<Vec<Ticket>, StoreError>;
    async fn count_with_status(&self, statuses: &[TicketStatus]) -> Result<i64, StoreError>;
}

const TICKET_COLUMNS: &str = "id, title, description, category, priority, status, ai_response, staff_response, user_id, property_id, qube_case_id, created_at, updated_at";

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket, StoreError> {
    let priority: String = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    let property_id: Option<i64> = row.try_get("property_id")?;
    Ok(Ticket {
        id: TicketId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        priority: priority.parse()?,
        status: status.parse()?,
        ai_response: row.try_get("ai_response")?,
        staff_response: row.try_get("staff_response")?,
        user_id: UserId(row.try_get("user_id")?),
        property_id: property_id.map(PropertyId),
        qube_case_id: row.try_get("qube_case_id")?,
        created_at: db::from_timestamp(row.try_get("created_at")?),
        updated_at: db::from_timestamp(row.try_get("updated_at")?),
    })
}

fn update_statement(ticket: &Ticket) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        r#"
        UPDATE tickets
        SET priority = ?, status = ?, ai_response = ?, staff_response = ?, qube_case_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(ticket.priority.as_str())
    .bind(ticket.status.as_str())
    .bind(&ticket.ai_response)
    .bind(&ticket.staff_response)
    .bind(&ticket.qube_case_id)
    .bind(ticket.updated_at.timestamp())
    .bind(&ticket.id.0)
}

#[async_trait]
impl TicketRepository for SqliteStore {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tickets (id, title, description, category, priority, status, ai_response, staff_response, user_id, property_id, qube_case_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ticket.id.0)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(&ticket.category)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(&ticket.ai_response)
        .bind(&ticket.staff_response)
        .bind(&ticket.user_id.0)
        .bind(ticket.property_id.map(|id| id.0))
        .bind(&ticket.qube_case_id)
        .bind(ticket.created_at.timestamp())
        .bind(ticket.updated_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_write)?;

        Ok(ticket)
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let result = update_statement(ticket)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_many(&self, tickets: &[Ticket]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for ticket in tickets {
            let result = update_statement(ticket)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_write)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Ticket>, StoreError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?"
        ))
        .bind(&user.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn find_by_case_id(&self, case_id: &str) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE qube_case_id = ?"
        ))
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn find_by_case_ids(&self, case_ids: &[String]) -> Result<Vec<Ticket>, StoreError> {
        if case_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE qube_case_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for case_id in case_ids {
            separated.push_bind(case_id.clone());
        }
        separated.push_unseparated(") ORDER BY created_at DESC, rowid DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn count_with_status(&self, statuses: &[TicketStatus]) -> Result<i64, StoreError> {
        if statuses.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM tickets WHERE status IN (");
        let mut separated = builder.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
