//! The [`HelpdeskApi`] trait and its reqwest-backed implementation.

use std::time::Duration;

use tw_domain::config::HelpdeskConfig;
use tw_domain::error::{Error, Result};

use crate::types::{
    CommentPage, CommentsEnvelope, OrganizationEnvelope, OrganizationRecord, TicketEnvelope,
    TicketRecord, TriggerDescriptor, TriggerEnvelope, UserEnvelope, UserRecord, WebhookDescriptor,
    WebhookEnvelope,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every helpdesk operation the workflows depend on.
///
/// Reads are side-effect-free; `create_webhook` is the only call expected
/// to be paired with an identity check for idempotency (the caller stamps
/// a known id and the webhook workflow consults [`HelpdeskApi::get_webhook`]
/// before creating).
#[async_trait::async_trait]
pub trait HelpdeskApi: Send + Sync {
    async fn get_ticket(&self, id: i64) -> Result<TicketRecord>;

    async fn get_user(&self, id: i64) -> Result<UserRecord>;

    async fn get_organization(&self, id: i64) -> Result<OrganizationRecord>;

    /// One page of ticket comments, oldest first, resuming from `cursor`
    /// ("" = from the beginning).
    async fn list_comments(&self, ticket_id: i64, cursor: &str, page_size: u32)
        -> Result<CommentPage>;

    /// Create the webhook and return its helpdesk-assigned identity.
    async fn create_webhook(&self, descriptor: WebhookDescriptor) -> Result<String>;

    /// Look up a webhook; `Ok(None)` when it no longer exists.
    async fn get_webhook(&self, id: &str) -> Result<Option<WebhookDescriptor>>;

    /// Create the companion trigger addressing `webhook_id`; returns the
    /// trigger's identity.
    async fn create_trigger(&self, webhook_id: &str) -> Result<String>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const TRIGGER_TITLE: &str = "Notify Ticketwise";

/// Production client speaking the helpdesk's v2 REST API with API-token
/// basic auth (`{email}/token` : token).
pub struct HttpHelpdeskClient {
    base_url: String,
    email: String,
    api_token: String,
    client: reqwest::Client,
}

impl HttpHelpdeskClient {
    pub fn from_config(cfg: &HelpdeskConfig, call_timeout: Duration) -> Result<Self> {
        let api_token = cfg.resolve_api_token().ok_or_else(|| {
            Error::Auth(format!(
                "no helpdesk API token configured (set {} or helpdesk.api_token)",
                cfg.api_token_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: format!("https://{}.zendesk.com/api/v2", cfg.subdomain),
            email: cfg.email.clone(),
            api_token,
            client,
        })
    }

    /// Client against an arbitrary base URL (tests, self-hosted gateways).
    pub fn with_base_url(base_url: &str, email: &str, api_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
            client,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(format!("{}/token", self.email), Some(&self.api_token))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .basic_auth(format!("{}/token", self.email), Some(&self.api_token))
            .header("Content-Type", "application/json")
    }

    /// Send a request and deserialize the 2xx body, mapping 404 to
    /// [`Error::NotFound`] and other non-2xx statuses to [`Error::Http`].
    async fn expect_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(from_reqwest)?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Http(format!(
                "{what}: HTTP {} - {body}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body).map_err(Error::Json)
    }
}

#[async_trait::async_trait]
impl HelpdeskApi for HttpHelpdeskClient {
    async fn get_ticket(&self, id: i64) -> Result<TicketRecord> {
        let envelope: TicketEnvelope = self
            .expect_json(self.get(&format!("/tickets/{id}.json")), &format!("ticket {id}"))
            .await?;
        Ok(envelope.ticket)
    }

    async fn get_user(&self, id: i64) -> Result<UserRecord> {
        let envelope: UserEnvelope = self
            .expect_json(self.get(&format!("/users/{id}.json")), &format!("user {id}"))
            .await?;
        Ok(envelope.user)
    }

    async fn get_organization(&self, id: i64) -> Result<OrganizationRecord> {
        let envelope: OrganizationEnvelope = self
            .expect_json(
                self.get(&format!("/organizations/{id}.json")),
                &format!("organization {id}"),
            )
            .await?;
        Ok(envelope.organization)
    }

    async fn list_comments(
        &self,
        ticket_id: i64,
        cursor: &str,
        page_size: u32,
    ) -> Result<CommentPage> {
        let mut request = self
            .get(&format!("/tickets/{ticket_id}/comments.json"))
            .query(&[("page[size]", page_size.to_string())])
            .query(&[("sort", "created_at")]);
        if !cursor.is_empty() {
            request = request.query(&[("page[after]", cursor)]);
        }

        let envelope: CommentsEnvelope = self
            .expect_json(request, &format!("comments for ticket {ticket_id}"))
            .await?;

        Ok(CommentPage {
            comments: envelope
                .comments
                .into_iter()
                .map(|c| c.plain_body)
                .collect(),
            after_cursor: envelope.meta.after_cursor.unwrap_or_default(),
            has_more: envelope.meta.has_more,
        })
    }

    async fn create_webhook(&self, descriptor: WebhookDescriptor) -> Result<String> {
        let envelope: WebhookEnvelope = self
            .expect_json(
                self.post("/webhooks")
                    .json(&serde_json::json!({ "webhook": descriptor })),
                "webhook creation",
            )
            .await?;
        tracing::debug!(webhook_id = %envelope.webhook.id, "created helpdesk webhook");
        Ok(envelope.webhook.id)
    }

    async fn get_webhook(&self, id: &str) -> Result<Option<WebhookDescriptor>> {
        let result: Result<WebhookEnvelope> = self
            .expect_json(self.get(&format!("/webhooks/{id}")), &format!("webhook {id}"))
            .await;
        match result {
            Ok(envelope) => Ok(Some(envelope.webhook)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_trigger(&self, webhook_id: &str) -> Result<String> {
        let descriptor = notify_trigger(webhook_id);
        let envelope: TriggerEnvelope = self
            .expect_json(
                self.post("/triggers.json")
                    .json(&serde_json::json!({ "trigger": descriptor })),
                "trigger creation",
            )
            .await?;
        tracing::debug!(trigger_id = envelope.trigger.id, "created helpdesk trigger");
        Ok(envelope.trigger.id.to_string())
    }
}

/// Trigger firing the webhook on ticket creation and change, posting the
/// ticket URL so the gateway can resolve the ticket id.
fn notify_trigger(webhook_id: &str) -> TriggerDescriptor {
    use crate::types::{TriggerAction, TriggerCondition, TriggerConditions};

    TriggerDescriptor {
        title: TRIGGER_TITLE.into(),
        active: true,
        position: 1,
        description: "Notifies Ticketwise to regenerate the ticket summary".into(),
        conditions: TriggerConditions {
            any: vec![
                TriggerCondition {
                    field: "update_type".into(),
                    operator: "is".into(),
                    value: "Create".into(),
                },
                TriggerCondition {
                    field: "update_type".into(),
                    operator: "is".into(),
                    value: "Change".into(),
                },
            ],
        },
        actions: vec![TriggerAction {
            field: "notification_webhook".into(),
            value: serde_json::json!([
                webhook_id,
                "{\"ticket_url\": \"{{ticket.url}}\"}",
            ]),
        }],
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
