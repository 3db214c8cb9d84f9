//! Rental property catalogue.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewProperty, Property, PropertyId, PropertyStatus, PropertyType, PropertyUpdate};
pub use repository::PropertyRepository;
pub use router::router;
pub use service::{PropertyError, PropertyService};
