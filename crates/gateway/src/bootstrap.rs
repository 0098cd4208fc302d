//! Startup wiring: collaborators, engine, and webhook provisioning.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use tw_domain::config::Config;
use tw_domain::entity::Webhook;
use tw_engine::{Engine, JsonSnapshotStore, MemorySnapshotStore, SnapshotStore};
use tw_helpdesk::HttpHelpdeskClient;

use crate::api::auth::hash_token;
use crate::state::AppState;

/// Construct the shared application state from the resolved config.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let call_timeout = Duration::from_millis(config.engine.call_timeout_ms);
    let helpdesk = Arc::new(
        HttpHelpdeskClient::from_config(&config.helpdesk, call_timeout)
            .context("helpdesk client")?,
    );

    let summarizer = tw_llm::build_summarizer(&config.llm).context("LLM adapter")?;

    let store: Arc<dyn SnapshotStore> = match &config.engine.state_path {
        Some(path) => Arc::new(JsonSnapshotStore::new(path).context("snapshot store")?),
        None => {
            tracing::warn!("no engine.state_path configured, workflow state will not survive a restart");
            Arc::new(MemorySnapshotStore::default())
        }
    };

    let engine = Arc::new(Engine::new(&config, helpdesk, summarizer, store));

    let api_token = config.server.resolve_api_token();
    if api_token.is_none() {
        tracing::warn!(
            "no API token configured ({} unset), protected routes are open",
            config.server.api_token_env
        );
    }

    Ok(AppState {
        config,
        engine,
        api_token_hash: api_token.as_deref().map(hash_token),
    })
}

/// Provision the inbound helpdesk webhook and its trigger when a public
/// base URL is configured. Safe to call on every startup; the webhook
/// workflow makes it idempotent.
pub fn provision_webhook(state: &AppState) -> anyhow::Result<()> {
    let Some(base_url) = &state.config.helpdesk.webhook_base_url else {
        tracing::info!("no helpdesk.webhook_base_url configured, skipping webhook provisioning");
        return Ok(());
    };

    let api_token = state.config.server.resolve_api_token().unwrap_or_default();
    state
        .engine
        .upsert_webhook(Webhook {
            id: String::new(),
            base_url: base_url.clone(),
            api_token,
        })
        .context("webhook provisioning signal")?;

    tracing::info!(base_url = %base_url, "webhook provisioning requested");
    Ok(())
}
