use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::domain::{NewProperty, Property, PropertyId};
use crate::accounts::UserId;
use crate::db::{self, SqliteStore, StoreError};

/// Storage abstraction for properties.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert(&self, draft: NewProperty, owner: Option<UserId>)
        -> Result<Property, StoreError>;
    async fn find(&self, id: PropertyId) -> Result<Option<Property>, StoreError>;
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Property>, StoreError>;
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Property>, StoreError>;
    async fn update(&self, property: &Property) -> Result<(), StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
}

const PROPERTY_COLUMNS: &str = "id, address, property_type, size, bedrooms, bathrooms, rent_amount, status, owner_id, created_at";

fn property_from_row(row: &SqliteRow) -> Result<Property, StoreError> {
    let property_type: String = row.try_get("property_type")?;
    let status: String = row.try_get("status")?;
    let owner_id: Option<String> = row.try_get("owner_id")?;
    Ok(Property {
        id: PropertyId(row.try_get("id")?),
        address: row.try_get("address")?,
        property_type: property_type.parse()?,
        size: row.try_get("size")?,
        bedrooms: row.try_get("bedrooms")?,
        bathrooms: row.try_get("bathrooms")?,
        rent_amount: row.try_get("rent_amount")?,
        status: status.parse()?,
        owner_id: owner_id.map(UserId),
        created_at: db::from_timestamp(row.try_get("created_at")?),
    })
}

#[async_trait]
impl PropertyRepository for SqliteStore {
    async fn insert(
        &self,
        draft: NewProperty,
        owner: Option<UserId>,
    ) -> Result<Property, StoreError> {
        let created_at = db::now();
        let result = sqlx::query(
            r#"
            INSERT INTO properties (address, property_type, size, bedrooms, bathrooms, rent_amount, status, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.address.trim())
        .bind(draft.property_type.as_str())
        .bind(draft.size)
        .bind(draft.bedrooms)
        .bind(draft.bathrooms)
        .bind(draft.rent_amount)
        .bind(draft.status.as_str())
        .bind(owner.as_ref().map(|id| id.0.as_str()))
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_write)?;

        Ok(Property {
            id: PropertyId(result.last_insert_rowid()),
            address: draft.address.trim().to_string(),
            property_type: draft.property_type,
            size: draft.size,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            rent_amount: draft.rent_amount,
            status: draft.status,
            owner_id: owner,
            created_at,
        })
    }

    async fn find(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(property_from_row).transpose()
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(property_from_row).collect()
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Property>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE owner_id = ? ORDER BY id"
        ))
        .bind(&owner.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(property_from_row).collect()
    }

    async fn update(&self, property: &Property) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE properties SET address = ?, rent_amount = ?, status = ? WHERE id = ?",
        )
        .bind(&property.address)
        .bind(property.rent_amount)
        .bind(property.status.as_str())
        .bind(property.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
