//! The webhook-provisioning workflow (singleton).
//!
//! Repeat upserts are idempotent: the workflow stamps its cached webhook
//! id onto every incoming request, checks whether that webhook still
//! exists in the helpdesk, and only creates a new webhook (and its
//! companion trigger) when it does not.

use std::sync::Arc;

use tw_domain::entity::{UpsertWebhook, Webhook};
use tw_domain::error::Result;
use tw_helpdesk::types::{WebhookAuthData, WebhookAuthentication, WebhookDescriptor};
use tw_helpdesk::HelpdeskApi;

use crate::retry::{with_retry, RetryPolicy};
use crate::runtime::EntityWorkflow;

pub const WEBHOOK_NAME: &str = "Ticketwise Webhook";
pub const WEBHOOK_ENDPOINT_PATH: &str = "/api/v1/ticket";
pub const WEBHOOK_AUTH_HEADER: &str = "X-Ticketwise-Key";

pub struct WebhookWorkflow {
    helpdesk: Arc<dyn HelpdeskApi>,
    retry: RetryPolicy,
}

impl WebhookWorkflow {
    pub fn new(helpdesk: Arc<dyn HelpdeskApi>, retry: RetryPolicy) -> Self {
        Self { helpdesk, retry }
    }
}

#[async_trait::async_trait]
impl EntityWorkflow for WebhookWorkflow {
    type State = Webhook;
    type Signal = UpsertWebhook;
    const ENTITY: &'static str = "webhook";

    async fn apply(&self, state: &mut Webhook, signal: UpsertWebhook) -> Result<()> {
        let mut desired = signal.webhook;
        // The id is never caller-supplied; the cached one decides whether
        // anything needs creating.
        desired.id = state.id.clone();

        let exists = if desired.id.is_empty() {
            false
        } else {
            with_retry(&self.retry, "look up webhook", || {
                self.helpdesk.get_webhook(&desired.id)
            })
            .await?
            .is_some()
        };

        if exists {
            tracing::debug!(webhook_id = %desired.id, "webhook already provisioned");
        } else {
            let descriptor = webhook_descriptor(&desired);
            let new_id = with_retry(&self.retry, "create webhook", || {
                self.helpdesk.create_webhook(descriptor.clone())
            })
            .await?;
            tracing::info!(webhook_id = %new_id, endpoint = %descriptor.endpoint, "webhook created");
            desired.id = new_id;

            let trigger_id = with_retry(&self.retry, "create trigger", || {
                self.helpdesk.create_trigger(&desired.id)
            })
            .await?;
            tracing::info!(trigger_id = %trigger_id, "notification trigger created");
        }

        *state = desired;
        Ok(())
    }
}

/// The webhook resource this deployment wants to exist in the helpdesk.
fn webhook_descriptor(webhook: &Webhook) -> WebhookDescriptor {
    WebhookDescriptor {
        id: String::new(),
        name: WEBHOOK_NAME.into(),
        status: "active".into(),
        endpoint: format!(
            "{}{}",
            webhook.base_url.trim_end_matches('/'),
            WEBHOOK_ENDPOINT_PATH
        ),
        http_method: "POST".into(),
        request_format: "json".into(),
        authentication: if webhook.api_token.is_empty() {
            None
        } else {
            Some(WebhookAuthentication {
                kind: "api_key".into(),
                add_position: "header".into(),
                data: WebhookAuthData {
                    name: WEBHOOK_AUTH_HEADER.into(),
                    value: webhook.api_token.clone(),
                },
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_targets_the_ticket_endpoint() {
        let descriptor = webhook_descriptor(&Webhook {
            id: String::new(),
            base_url: "https://ticketwise.example.com/".into(),
            api_token: "s3cret".into(),
        });
        assert_eq!(descriptor.name, WEBHOOK_NAME);
        assert_eq!(
            descriptor.endpoint,
            "https://ticketwise.example.com/api/v1/ticket"
        );
        let auth = descriptor.authentication.unwrap();
        assert_eq!(auth.data.name, WEBHOOK_AUTH_HEADER);
        assert_eq!(auth.data.value, "s3cret");
    }

    #[test]
    fn descriptor_without_token_skips_authentication() {
        let descriptor = webhook_descriptor(&Webhook {
            id: String::new(),
            base_url: "https://ticketwise.example.com".into(),
            api_token: String::new(),
        });
        assert!(descriptor.authentication.is_none());
    }
}
