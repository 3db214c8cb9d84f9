use std::sync::Arc;

use tracing::info;

use super::domain::{NewProperty, Property, PropertyId, PropertyUpdate};
use super::repository::PropertyRepository;
use crate::accounts::User;
use crate::db::StoreError;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Property {0} not found")]
    NotFound(PropertyId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(properties: Arc<dyn PropertyRepository>) -> Self {
        Self { properties }
    }

    pub async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Property>, PropertyError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        Ok(self.properties.list(skip, limit).await?)
    }

    pub async fn create(&self, actor: &User, draft: NewProperty) -> Result<Property, PropertyError> {
        if !actor.is_admin() {
            return Err(PropertyError::Forbidden(
                "Not authorized to create properties".to_string(),
            ));
        }
        draft.validate().map_err(PropertyError::Validation)?;

        let property = self.properties.insert(draft, Some(actor.id.clone())).await?;
        info!(property_id = %property.id, owner_id = %actor.id, "created property");
        Ok(property)
    }

    pub async fn get(&self, id: PropertyId) -> Result<Property, PropertyError> {
        self.properties
            .find(id)
            .await?
            .ok_or(PropertyError::NotFound(id))
    }

    pub async fn update(
        &self,
        actor: &User,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<Property, PropertyError> {
        if !actor.is_admin() {
            return Err(PropertyError::Forbidden(
                "Not authorized to update properties".to_string(),
            ));
        }
        let mut property = self.get(id).await?;
        update
            .apply(&mut property)
            .map_err(PropertyError::Validation)?;
        self.properties.update(&property).await?;
        info!(property_id = %property.id, status = property.status.as_str(), "updated property");
        Ok(property)
    }
}
