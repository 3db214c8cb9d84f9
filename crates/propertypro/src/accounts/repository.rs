use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::domain::{Role, User, UserId};
use crate::db::{self, SqliteStore, StoreError};

/// Storage abstraction for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn count_by_role(&self, role: Role) -> Result<i64, StoreError>;
}

const USER_COLUMNS: &str =
    "id, email, hashed_password, full_name, role, is_active, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    let updated_at: Option<i64> = row.try_get("updated_at")?;
    Ok(User {
        id: UserId(row.try_get("id")?),
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        full_name: row.try_get("full_name")?,
        role: role.parse()?,
        is_active: row.try_get("is_active")?,
        created_at: db::from_timestamp(row.try_get("created_at")?),
        updated_at: updated_at.map(db::from_timestamp),
    })
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, hashed_password, full_name, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id.0)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at.timestamp())
        .bind(user.updated_at.map(|at| at.timestamp()))
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_write)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
