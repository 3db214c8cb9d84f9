//! Tenant support tickets with drafted first replies and email notifications.

pub mod assist;
pub mod domain;
pub mod notifications;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assist::{TicketResponder, FALLBACK_RESPONSE};
pub use domain::{NewTicket, Ticket, TicketId, TicketPriority, TicketStatus, TicketUpdate};
pub use notifications::{TicketEvent, TicketNotifier};
pub use repository::TicketRepository;
pub use router::router;
pub use service::{TicketError, TicketService};
