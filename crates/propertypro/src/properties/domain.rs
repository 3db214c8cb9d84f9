use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;
use crate::error::UnknownValue;

/// Store-assigned property identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Commercial => "commercial",
        }
    }
}

impl FromStr for PropertyType {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "commercial" => Ok(PropertyType::Commercial),
            _ => Err(UnknownValue::new("property type", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Available,
    Rented,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Rented => "rented",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(PropertyStatus::Available),
            "rented" => Ok(PropertyStatus::Rented),
            _ => Err(UnknownValue::new("property status", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub address: String,
    pub property_type: PropertyType,
    /// Floor area in square feet.
    pub size: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub rent_amount: f64,
    pub status: PropertyStatus,
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub address: String,
    pub property_type: PropertyType,
    pub size: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub rent_amount: f64,
    #[serde(default)]
    pub status: PropertyStatus,
}

impl NewProperty {
    /// Returns the first rule the payload breaks, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("address must not be empty".to_string());
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err("size must be greater than zero".to_string());
        }
        if !self.rent_amount.is_finite() || self.rent_amount < 0.0 {
            return Err("rent_amount must not be negative".to_string());
        }
        Ok(())
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rent_amount: Option<f64>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
}

impl PropertyUpdate {
    pub fn apply(self, property: &mut Property) -> Result<(), String> {
        if let Some(address) = self.address {
            let address = address.trim();
            if address.is_empty() {
                return Err("address must not be empty".to_string());
            }
            property.address = address.to_string();
        }
        if let Some(rent) = self.rent_amount {
            if !rent.is_finite() || rent < 0.0 {
                return Err("rent_amount must not be negative".to_string());
            }
            property.rent_amount = rent;
        }
        if let Some(status) = self.status {
            property.status = status;
        }
        Ok(())
    }
}
