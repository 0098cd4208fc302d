//! Wire types for the helpdesk REST API.
//!
//! Only the fields the workflows consume are modeled; unknown fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Read models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw ticket as returned by the helpdesk (identifiers, not names).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketRecord {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub requester_id: Option<i64>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub organization_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub notes: String,
}

/// One page of ticket comments under cursor pagination.
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    /// Plain-text comment bodies, oldest first.
    pub comments: Vec<String>,
    /// Cursor to resume from for the page after this one.
    pub after_cursor: String,
    pub has_more: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Webhook / trigger provisioning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Webhook resource as created in / read from the helpdesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookDescriptor {
    /// Helpdesk-assigned identity ("" before creation).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub status: String,
    pub endpoint: String,
    pub http_method: String,
    pub request_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<WebhookAuthentication>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAuthentication {
    #[serde(rename = "type")]
    pub kind: String,
    pub add_position: String,
    pub data: WebhookAuthData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAuthData {
    pub name: String,
    pub value: String,
}

/// Trigger resource notifying the webhook on ticket create/change.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerDescriptor {
    pub title: String,
    pub active: bool,
    pub position: i64,
    pub description: String,
    pub conditions: TriggerConditions,
    pub actions: Vec<TriggerAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerConditions {
    pub any: Vec<TriggerCondition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerCondition {
    pub field: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerAction {
    pub field: String,
    pub value: serde_json::Value,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response envelopes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub(crate) struct TicketEnvelope {
    pub ticket: TicketRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganizationEnvelope {
    pub organization: OrganizationRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsEnvelope {
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub meta: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRecord {
    #[serde(default)]
    pub plain_body: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaginationMeta {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub after_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEnvelope {
    pub webhook: WebhookDescriptor,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriggerEnvelope {
    pub trigger: CreatedTrigger,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTrigger {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_envelope_parses_with_missing_optionals() {
        let raw = r#"{
            "ticket": {
                "id": 12345,
                "subject": "Test Subject",
                "description": "it broke",
                "status": "open",
                "requester_id": 7,
                "organization_id": 101,
                "unknown_field": true
            }
        }"#;
        let envelope: TicketEnvelope = serde_json::from_str(raw).expect("should parse");
        assert_eq!(envelope.ticket.id, 12345);
        assert_eq!(envelope.ticket.subject, "Test Subject");
        assert_eq!(envelope.ticket.organization_id, Some(101));
        assert_eq!(envelope.ticket.assignee_id, None);
        assert_eq!(envelope.ticket.priority, None);
    }

    #[test]
    fn comments_envelope_parses_cursor_meta() {
        let raw = r#"{
            "comments": [
                {"plain_body": "first"},
                {"plain_body": "second"}
            ],
            "meta": {"has_more": true, "after_cursor": "next-page-token"}
        }"#;
        let envelope: CommentsEnvelope = serde_json::from_str(raw).expect("should parse");
        assert_eq!(envelope.comments.len(), 2);
        assert!(envelope.meta.has_more);
        assert_eq!(envelope.meta.after_cursor.as_deref(), Some("next-page-token"));
    }

    #[test]
    fn webhook_descriptor_omits_empty_id_on_create() {
        let descriptor = WebhookDescriptor {
            id: String::new(),
            name: "Ticketwise Webhook".into(),
            status: "active".into(),
            endpoint: "https://example.test/api/v1/ticket".into(),
            http_method: "POST".into(),
            request_format: "json".into(),
            authentication: None,
        };
        let json = serde_json::to_value(&descriptor).expect("should serialize");
        assert!(json.get("id").is_none());
    }
}
