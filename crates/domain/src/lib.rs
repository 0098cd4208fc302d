//! Shared domain types for Ticketwise: configuration, the crate-wide error
//! type, the summarized entities (ticket, organization, webhook), and the
//! truncation policy that bounds their accumulated state.

pub mod config;
pub mod entity;
pub mod error;
pub mod truncate;

pub use entity::{Organization, Ticket, Webhook};
pub use error::{Error, Result};
