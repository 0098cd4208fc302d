//! Typed async client for the external helpdesk REST API.
//!
//! Everything the workflows need from the helpdesk goes through the
//! [`HelpdeskApi`] trait so tests can substitute an in-memory double;
//! [`HttpHelpdeskClient`] is the production implementation.

pub mod client;
pub mod types;
pub mod url;

pub use client::{HelpdeskApi, HttpHelpdeskClient};
pub use types::{
    CommentPage, OrganizationRecord, TicketRecord, TriggerDescriptor, UserRecord,
    WebhookDescriptor,
};
pub use url::parse_ticket_url;
