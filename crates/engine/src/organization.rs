//! The per-organization workflow.
//!
//! Receives one signal per fresh ticket summary. Organization metadata
//! is fetched lazily on the first signal of the workflow's lifetime and
//! carried over across handoffs; the per-ticket summary map is bounded
//! by the configured cap, dropping the lowest ticket ids first.

use std::sync::Arc;

use tw_domain::entity::{Organization, UpsertOrganization};
use tw_domain::error::Result;
use tw_domain::truncate::truncate_summary_map;
use tw_helpdesk::HelpdeskApi;
use tw_llm::Summarizer;

use crate::retry::{with_retry, RetryPolicy};
use crate::runtime::EntityWorkflow;

pub struct OrganizationWorkflow {
    helpdesk: Arc<dyn HelpdeskApi>,
    summarizer: Arc<dyn Summarizer>,
    retry: RetryPolicy,
    max_ticket_summaries: usize,
    prompt: String,
}

impl OrganizationWorkflow {
    pub fn new(
        helpdesk: Arc<dyn HelpdeskApi>,
        summarizer: Arc<dyn Summarizer>,
        retry: RetryPolicy,
        max_ticket_summaries: usize,
        prompt: String,
    ) -> Self {
        Self {
            helpdesk,
            summarizer,
            retry,
            max_ticket_summaries,
            prompt,
        }
    }
}

#[async_trait::async_trait]
impl EntityWorkflow for OrganizationWorkflow {
    type State = Organization;
    type Signal = UpsertOrganization;
    const ENTITY: &'static str = "organization";

    async fn apply(&self, state: &mut Organization, signal: UpsertOrganization) -> Result<()> {
        if state.id == 0 {
            state.id = signal.organization_id;
        }

        // Metadata is fetched once per organization lifetime.
        if state.name.is_empty() {
            let record = with_retry(&self.retry, "fetch organization", || {
                self.helpdesk.get_organization(signal.organization_id)
            })
            .await?;
            state.id = record.id;
            state.name = record.name;
            state.details = record.details;
            state.notes = record.notes;
        }

        if state.ticket_summaries.get(&signal.ticket_id) == Some(&signal.ticket_summary) {
            tracing::debug!(
                organization = signal.organization_id,
                ticket = signal.ticket_id,
                "ticket summary unchanged, skipping regeneration"
            );
            return Ok(());
        }

        state
            .ticket_summaries
            .insert(signal.ticket_id, signal.ticket_summary);
        let (kept, truncated) = truncate_summary_map(
            std::mem::take(&mut state.ticket_summaries),
            self.max_ticket_summaries,
        );
        state.ticket_summaries = kept;
        if truncated {
            tracing::debug!(
                organization = signal.organization_id,
                cap = self.max_ticket_summaries,
                "ticket summary map truncated"
            );
        }

        let content = serde_json::to_string(&*state)?;
        let generated = with_retry(&self.retry, "generate organization summary", || {
            self.summarizer.generate(&self.prompt, &content)
        })
        .await?;
        // An empty generation result never erases the last good summary;
        // the map update above is still committed.
        if generated.is_empty() {
            tracing::warn!(
                organization = signal.organization_id,
                "generation returned no text, keeping previous summary"
            );
            return Ok(());
        }
        state.summary = generated;
        tracing::info!(
            organization = signal.organization_id,
            tickets = state.ticket_summaries.len(),
            "organization summary regenerated"
        );

        Ok(())
    }
}
