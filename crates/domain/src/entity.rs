//! The summarized entities and the signal payloads that update them.
//!
//! Each entity is the full carried-over state of one durable workflow: it is
//! what survives a continue-as-new handoff and what a query reads from. The
//! signal structs are the envelopes delivered to a workflow's mailbox and
//! consumed exactly once by its run loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ticket
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-ticket workflow state.
///
/// `id == 0` means the snapshot has never been fetched. The comment cursor
/// only moves forward: it is replaced exclusively by a fetch cycle that
/// returned a non-empty batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub assignee: String,
    /// Owning organization's display name ("" when the ticket has none).
    #[serde(default)]
    pub organization: String,
    /// Owning organization's identity (0 when the ticket has none).
    #[serde(default)]
    pub organization_id: i64,

    /// Comment batch accumulated since the last summary.
    #[serde(default)]
    pub comments: Vec<String>,
    /// Opaque pagination cursor; "" means "from the beginning".
    #[serde(default)]
    pub after_cursor: String,

    /// LLM-generated summary.
    #[serde(default)]
    pub summary: String,
}

impl Ticket {
    /// Copy of the ticket with the prior summary and the cursor cleared,
    /// suitable for feeding to the generator without the model echoing its
    /// own stale output back.
    pub fn cleansed(&self) -> Ticket {
        let mut ticket = self.clone();
        ticket.summary.clear();
        ticket.after_cursor.clear();
        ticket
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Organization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-organization workflow state.
///
/// `name == ""` means the metadata snapshot has never been fetched; the
/// fetch happens once per organization lifetime and is carried over across
/// handoffs. The per-ticket summary map is bounded by the configured cap
/// (see [`crate::truncate::truncate_summary_map`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub details: String,

    /// Latest summary per contributing ticket, keyed by ticket id.
    #[serde(default)]
    pub ticket_summaries: HashMap<i64, String>,

    /// LLM-generated aggregate summary.
    #[serde(default)]
    pub summary: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Webhook
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Webhook workflow state (singleton; one per deployment).
///
/// `id` is assigned by the external helpdesk once the webhook is created
/// and is never supplied by a caller: the workflow stamps its own cached
/// id onto every incoming upsert, which is what makes repeat provisioning
/// idempotent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub id: String,
    /// Public base URL the helpdesk will call back into.
    #[serde(default)]
    pub base_url: String,
    /// Token inbound webhook calls must present.
    #[serde(default)]
    pub api_token: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Signal payloads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ask a ticket workflow to re-process its ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertTicket {
    pub ticket_id: String,
}

/// Deliver a ticket's fresh summary to its owning organization workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOrganization {
    pub organization_id: i64,
    pub ticket_id: i64,
    pub ticket_summary: String,
}

/// Ask the webhook workflow to provision the desired webhook + trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertWebhook {
    pub webhook: Webhook,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleansed_clears_summary_and_cursor_only() {
        let ticket = Ticket {
            id: 42,
            subject: "printer on fire".into(),
            comments: vec!["c1".into(), "c2".into()],
            after_cursor: "cursor-9".into(),
            summary: "old summary".into(),
            ..Default::default()
        };

        let cleansed = ticket.cleansed();
        assert_eq!(cleansed.id, 42);
        assert_eq!(cleansed.subject, "printer on fire");
        assert_eq!(cleansed.comments.len(), 2);
        assert!(cleansed.summary.is_empty());
        assert!(cleansed.after_cursor.is_empty());
        // The original is untouched.
        assert_eq!(ticket.summary, "old summary");
    }
}
