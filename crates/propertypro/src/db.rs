//! SQLite persistence bootstrap shared by every repository.
//!
//! Timestamps are stored as unix seconds; enums are stored as their lowercase
//! wire labels.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::UnknownValue;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unable to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not a valid {kind}: {value}")]
    Corrupt { kind: &'static str, value: String },
}

impl StoreError {
    /// Maps unique-constraint violations onto `Conflict`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict,
            _ => Self::Database(err),
        }
    }
}

impl From<UnknownValue> for StoreError {
    fn from(value: UnknownValue) -> Self {
        Self::Corrupt {
            kind: value.kind,
            value: value.value,
        }
    }
}

/// Repository implementation backed by a `sqlx` SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL,
            property_type TEXT NOT NULL,
            size REAL NOT NULL,
            bedrooms INTEGER NOT NULL,
            bathrooms INTEGER NOT NULL,
            rent_amount REAL NOT NULL,
            status TEXT NOT NULL,
            owner_id TEXT REFERENCES users(id),
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            priority TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            ai_response TEXT,
            staff_response TEXT,
            user_id TEXT NOT NULL REFERENCES users(id),
            property_id INTEGER REFERENCES properties(id),
            qube_case_id TEXT UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_properties_address ON properties(address)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_user ON tickets(user_id, created_at)")
        .execute(pool)
        .await?;

    info!("database schema ready");
    Ok(())
}

/// Current time truncated to the stored precision.
pub(crate) fn now() -> DateTime<Utc> {
    from_timestamp(Utc::now().timestamp())
}

pub(crate) fn from_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = connect_in_memory().await.expect("in-memory pool");
        migrate(&pool).await.expect("second migration run");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("list tables");
        assert_eq!(tables, vec!["properties", "tickets", "users"]);
    }

    #[tokio::test]
    async fn connect_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("propertypro.db"),
        };
        let pool = connect(&config).await.expect("file database opens");
        migrate(&pool).await.expect("schema applies");
        assert!(config.path.exists());
    }

    #[test]
    fn now_has_second_precision() {
        let at = now();
        assert_eq!(at.timestamp_subsec_nanos(), 0);
    }
}
