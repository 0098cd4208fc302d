//! The engine facade wiring the workflow registries together.

use std::sync::Arc;

use tw_domain::config::Config;
use tw_domain::entity::{Organization, Ticket, UpsertOrganization, UpsertTicket, UpsertWebhook, Webhook};
use tw_domain::error::Result;
use tw_helpdesk::HelpdeskApi;
use tw_llm::Summarizer;

use crate::organization::OrganizationWorkflow;
use crate::retry::RetryPolicy;
use crate::runtime::WorkflowRegistry;
use crate::snapshot::SnapshotStore;
use crate::ticket::{OrganizationSignaler, TicketWorkflow};
use crate::webhook::WebhookWorkflow;

// ── workflow identities ────────────────────────────────────────────

pub fn ticket_workflow_id(ticket_id: i64) -> String {
    format!("ticket-workflow-{ticket_id}")
}

pub fn organization_workflow_id(organization_id: i64) -> String {
    format!("organization-workflow-{organization_id}")
}

pub const WEBHOOK_WORKFLOW_ID: &str = "webhook-workflow";

impl OrganizationSignaler for WorkflowRegistry<OrganizationWorkflow> {
    fn upsert(&self, signal: UpsertOrganization) -> Result<()> {
        self.signal_with_start(&organization_workflow_id(signal.organization_id), signal)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Owns the ticket, organization, and webhook workflow registries and
/// exposes the signal/query surface the gateway talks to.
pub struct Engine {
    tickets: Arc<WorkflowRegistry<TicketWorkflow>>,
    organizations: Arc<WorkflowRegistry<OrganizationWorkflow>>,
    webhook: Arc<WorkflowRegistry<WebhookWorkflow>>,
}

impl Engine {
    pub fn new(
        config: &Config,
        helpdesk: Arc<dyn HelpdeskApi>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.engine.retry, config.engine.call_timeout_ms);

        let organizations = Arc::new(WorkflowRegistry::new(
            OrganizationWorkflow::new(
                helpdesk.clone(),
                summarizer.clone(),
                retry.clone(),
                config.engine.max_ticket_summaries,
                config.llm.org_summary_prompt.clone(),
            ),
            store.clone(),
            config.engine.handoff_threshold,
        ));

        let tickets = Arc::new(WorkflowRegistry::new(
            TicketWorkflow::new(
                helpdesk.clone(),
                summarizer,
                organizations.clone() as Arc<dyn OrganizationSignaler>,
                retry.clone(),
                config.helpdesk.page_size,
                config.engine.max_comment_bytes,
                config.llm.ticket_summary_prompt.clone(),
            ),
            store.clone(),
            config.engine.handoff_threshold,
        ));

        let webhook = Arc::new(WorkflowRegistry::new(
            WebhookWorkflow::new(helpdesk, retry),
            store,
            config.engine.handoff_threshold,
        ));

        Self {
            tickets,
            organizations,
            webhook,
        }
    }

    // ── signals ────────────────────────────────────────────────────

    /// Ask the ticket's workflow to re-process it, starting the workflow
    /// if needed. Returns as soon as the signal is queued.
    pub fn upsert_ticket(&self, ticket_id: i64) -> Result<()> {
        self.tickets.signal_with_start(
            &ticket_workflow_id(ticket_id),
            UpsertTicket {
                ticket_id: ticket_id.to_string(),
            },
        )
    }

    /// Provision (or re-check) the helpdesk webhook and its trigger.
    pub fn upsert_webhook(&self, webhook: Webhook) -> Result<()> {
        self.webhook
            .signal_with_start(WEBHOOK_WORKFLOW_ID, UpsertWebhook { webhook })
    }

    // ── queries ────────────────────────────────────────────────────

    pub fn ticket(&self, ticket_id: i64) -> Option<Ticket> {
        self.tickets.query(&ticket_workflow_id(ticket_id))
    }

    pub fn ticket_error(&self, ticket_id: i64) -> Option<String> {
        self.tickets.last_error(&ticket_workflow_id(ticket_id))
    }

    pub fn organization(&self, organization_id: i64) -> Option<Organization> {
        self.organizations
            .query(&organization_workflow_id(organization_id))
    }

    pub fn webhook(&self) -> Option<Webhook> {
        self.webhook.query(WEBHOOK_WORKFLOW_ID)
    }

    // ── lifecycle ──────────────────────────────────────────────────

    /// Stop every workflow, draining mailboxes and writing final
    /// snapshots.
    pub async fn shutdown(&self) {
        tokio::join!(
            self.tickets.shutdown(),
            self.organizations.shutdown(),
            self.webhook.shutdown(),
        );
        tracing::info!("engine stopped");
    }
}
