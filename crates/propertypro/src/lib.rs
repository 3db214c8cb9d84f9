//! PropertyPro backend: tenant accounts, the property catalogue, support
//! tickets, email routing, and case synchronisation with Qube.

pub mod accounts;
pub mod admin;
pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mail;
pub mod policies;
pub mod properties;
pub mod qube;
pub mod telemetry;
pub mod tickets;

pub use http::{api_router, ApiState, Integrations};

#[cfg(test)]
pub(crate) mod testing;
