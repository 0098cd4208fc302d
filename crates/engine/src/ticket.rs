//! The per-ticket workflow.
//!
//! The first upsert cycle fetches the ticket's metadata snapshot and
//! resolves the people and organization names; the snapshot is then
//! carried in workflow state across handoffs. Every cycle pulls the
//! comments published since the stored cursor, regenerates the summary
//! when there is anything new to say, and forwards the fresh summary to
//! the owning organization's workflow.

use std::sync::Arc;

use tw_domain::entity::{Ticket, UpsertOrganization, UpsertTicket};
use tw_domain::error::{Error, Result};
use tw_domain::truncate::truncate_comment_batch;
use tw_helpdesk::types::OrganizationRecord;
use tw_helpdesk::HelpdeskApi;
use tw_llm::Summarizer;

use crate::retry::{with_retry, RetryPolicy};
use crate::runtime::EntityWorkflow;

/// Where ticket workflows deliver fresh summaries.
///
/// In production this is the organization workflow registry; tests swap
/// in a recorder.
pub trait OrganizationSignaler: Send + Sync {
    fn upsert(&self, signal: UpsertOrganization) -> Result<()>;
}

pub struct TicketWorkflow {
    helpdesk: Arc<dyn HelpdeskApi>,
    summarizer: Arc<dyn Summarizer>,
    organizations: Arc<dyn OrganizationSignaler>,
    retry: RetryPolicy,
    page_size: u32,
    max_comment_bytes: usize,
    prompt: String,
}

impl TicketWorkflow {
    pub fn new(
        helpdesk: Arc<dyn HelpdeskApi>,
        summarizer: Arc<dyn Summarizer>,
        organizations: Arc<dyn OrganizationSignaler>,
        retry: RetryPolicy,
        page_size: u32,
        max_comment_bytes: usize,
        prompt: String,
    ) -> Self {
        Self {
            helpdesk,
            summarizer,
            organizations,
            retry,
            page_size,
            max_comment_bytes,
            prompt,
        }
    }

    async fn user_name(&self, id: Option<i64>) -> Result<String> {
        match id {
            Some(id) if id != 0 => {
                let user =
                    with_retry(&self.retry, "fetch user", || self.helpdesk.get_user(id)).await?;
                Ok(user.name)
            }
            _ => Ok(String::new()),
        }
    }

    async fn owning_organization(&self, id: Option<i64>) -> Result<Option<OrganizationRecord>> {
        match id {
            Some(id) if id != 0 => {
                let record = with_retry(&self.retry, "fetch organization", || {
                    self.helpdesk.get_organization(id)
                })
                .await?;
                Ok(Some(record))
            }
            _ => Ok(None),
        }
    }

    /// Pull every comment page after `cursor`. Returns the new comments
    /// and the cursor of the last non-empty page.
    async fn fetch_new_comments(
        &self,
        ticket_id: i64,
        cursor: &str,
    ) -> Result<(Vec<String>, String)> {
        let mut collected = Vec::new();
        let mut cursor = cursor.to_owned();

        loop {
            let page = with_retry(&self.retry, "list comments", || {
                self.helpdesk.list_comments(ticket_id, &cursor, self.page_size)
            })
            .await?;

            let page_empty = page.comments.is_empty();
            collected.extend(page.comments);
            // The cursor only moves on pages that actually carried data,
            // so a quiet fetch cycle can never skip future comments.
            if !page_empty && !page.after_cursor.is_empty() {
                cursor = page.after_cursor;
            }
            if !page.has_more || page_empty {
                break;
            }
        }

        Ok((collected, cursor))
    }
}

#[async_trait::async_trait]
impl EntityWorkflow for TicketWorkflow {
    type State = Ticket;
    type Signal = UpsertTicket;
    const ENTITY: &'static str = "ticket";

    async fn apply(&self, state: &mut Ticket, signal: UpsertTicket) -> Result<()> {
        let ticket_id: i64 = signal.ticket_id.trim().parse().map_err(|_| {
            Error::InvalidArgument(format!("ticket id {:?} is not numeric", signal.ticket_id))
        })?;

        // Metadata is fetched once per workflow lifetime; an identity of
        // zero means no snapshot has been committed yet. A cycle that
        // fails later discards the scratch copy, so a half-fetched
        // snapshot is refetched on the next signal.
        let first_snapshot = state.id == 0;
        if first_snapshot {
            let record = with_retry(&self.retry, "fetch ticket", || {
                self.helpdesk.get_ticket(ticket_id)
            })
            .await?;

            // Independent read-only lookups, issued concurrently.
            let (requester, assignee, organization) = tokio::try_join!(
                self.user_name(record.requester_id),
                self.user_name(record.assignee_id),
                self.owning_organization(record.organization_id),
            )?;

            state.id = record.id;
            state.subject = record.subject;
            state.description = record.description;
            state.priority = record.priority.unwrap_or_default();
            state.status = record.status.unwrap_or_default();
            state.requester = requester;
            state.assignee = assignee;
            if let Some(org) = organization {
                state.organization = org.name;
                state.organization_id = org.id;
            }
        }

        let (new_comments, cursor) = self.fetch_new_comments(ticket_id, &state.after_cursor).await?;

        let fetched_new = !new_comments.is_empty();
        if fetched_new {
            // A non-empty batch replaces the previous one; the summary
            // already folds in everything older than the cursor.
            let (kept, truncated) = truncate_comment_batch(new_comments, self.max_comment_bytes);
            state.comments = kept;
            state.after_cursor = cursor;
            if truncated {
                tracing::debug!(ticket = ticket_id, "comment batch truncated to byte budget");
            }
        }

        if !fetched_new && !state.summary.is_empty() {
            tracing::debug!(ticket = ticket_id, "no new comments, keeping summary");
            return Ok(());
        }

        // Strip the previous summary and the cursor before generation so
        // the model never sees its own stale output.
        let content = serde_json::to_string(&state.cleansed())?;
        let generated = with_retry(&self.retry, "generate ticket summary", || {
            self.summarizer.generate(&self.prompt, &content)
        })
        .await?;
        // An empty result never erases the last good summary; the cursor
        // and comment batch committed above stand either way.
        if generated.is_empty() {
            tracing::warn!(ticket = ticket_id, "generation returned no text, keeping previous summary");
            return Ok(());
        }
        state.summary = generated;
        tracing::info!(ticket = ticket_id, "ticket summary regenerated");

        if state.organization_id != 0 {
            self.organizations.upsert(UpsertOrganization {
                organization_id: state.organization_id,
                ticket_id: state.id,
                ticket_summary: state.summary.clone(),
            })?;
        }

        Ok(())
    }
}
