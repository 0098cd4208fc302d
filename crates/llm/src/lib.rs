//! Summary-generation adapters.
//!
//! One [`Summarizer`] implementation per supported provider, selected
//! explicitly through [`LlmConfig::provider`]; the active adapter is
//! never inferred from which API key happens to be set.

pub mod google;
pub mod openai;
pub mod traits;
mod util;

use std::sync::Arc;

use tw_domain::config::{LlmConfig, ProviderKind};
use tw_domain::error::{Error, Result};

pub use google::GoogleSummarizer;
pub use openai::OpenAiSummarizer;
pub use traits::Summarizer;

/// Construct the configured adapter.
///
/// The API key is resolved in order: the plaintext `api_key` field, the
/// `api_key_env` variable, then the provider's conventional variable
/// (`GEMINI_API_KEY` / `OPENAI_API_KEY`). No key is a hard error.
pub fn build_summarizer(cfg: &LlmConfig) -> Result<Arc<dyn Summarizer>> {
    let api_key = resolve_api_key(cfg)?;
    let model = cfg.model.as_deref();
    let base_url = cfg.base_url.as_deref();

    let summarizer: Arc<dyn Summarizer> = match cfg.provider {
        ProviderKind::Google => Arc::new(GoogleSummarizer::new(api_key, model, base_url)?),
        ProviderKind::Openai => Arc::new(OpenAiSummarizer::new(api_key, model, base_url)?),
    };
    tracing::info!(provider = summarizer.provider_id(), "LLM adapter ready");
    Ok(summarizer)
}

fn resolve_api_key(cfg: &LlmConfig) -> Result<String> {
    if let Some(key) = &cfg.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    let env_var = match (&cfg.api_key_env, cfg.provider) {
        (Some(var), _) if !var.is_empty() => var.clone(),
        (_, ProviderKind::Google) => "GEMINI_API_KEY".into(),
        (_, ProviderKind::Openai) => "OPENAI_API_KEY".into(),
    };

    std::env::var(&env_var)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Config(format!("no LLM API key configured (set {env_var})")))
}
