//! Durable entity workflows: one mailbox-driven task per ticket,
//! organization, and webhook, with snapshot persistence, execution
//! handoff, and retried collaborator calls.

pub mod engine;
pub mod organization;
pub mod retry;
pub mod runtime;
pub mod snapshot;
pub mod ticket;
pub mod webhook;

pub use engine::{organization_workflow_id, ticket_workflow_id, Engine, WEBHOOK_WORKFLOW_ID};
pub use retry::{with_retry, RetryPolicy};
pub use runtime::{EntityWorkflow, WorkflowRegistry};
pub use snapshot::{JsonSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore};
pub use ticket::OrganizationSignaler;
