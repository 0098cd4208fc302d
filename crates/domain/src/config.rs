use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub helpdesk: HelpdeskConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_8316")]
    pub port: u16,
    /// API token inbound callers must present (plaintext — prefer
    /// `api_token_env`).
    #[serde(default)]
    pub api_token: Option<String>,
    /// Environment variable holding the API token.
    #[serde(default = "d_token_env")]
    pub api_token_env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: 8316,
            api_token: None,
            api_token_env: d_token_env(),
        }
    }
}

impl ServerConfig {
    /// Resolve the inbound API token: plaintext config field first (warn),
    /// then the configured environment variable. `None` = dev mode.
    pub fn resolve_api_token(&self) -> Option<String> {
        if let Some(token) = &self.api_token {
            if !token.is_empty() {
                tracing::warn!(
                    "API token loaded from plaintext config field 'api_token' — \
                     prefer 'api_token_env' instead"
                );
                return Some(token.clone());
            }
        }
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.is_empty())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpdesk API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    /// Helpdesk account subdomain (e.g. `acme` for `acme.zendesk.com`).
    #[serde(default)]
    pub subdomain: String,
    /// Agent email used for API token authentication.
    #[serde(default)]
    pub email: String,
    /// API token (plaintext — prefer `api_token_env`).
    #[serde(default)]
    pub api_token: Option<String>,
    /// Environment variable holding the API token.
    #[serde(default = "d_helpdesk_token_env")]
    pub api_token_env: String,
    /// Public base URL of this deployment; when set, the inbound webhook
    /// and its companion trigger are provisioned at startup.
    #[serde(default)]
    pub webhook_base_url: Option<String>,
    /// Comment page size for cursor pagination.
    #[serde(default = "d_100")]
    pub page_size: u32,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            email: String::new(),
            api_token: None,
            api_token_env: d_helpdesk_token_env(),
            webhook_base_url: None,
            page_size: 100,
        }
    }
}

impl HelpdeskConfig {
    pub fn resolve_api_token(&self) -> Option<String> {
        if let Some(token) = &self.api_token {
            if !token.is_empty() {
                return Some(token.clone());
            }
        }
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.is_empty())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which summary-generation adapter to use.
///
/// Selected explicitly here, never inferred from which API key happens to
/// be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_provider")]
    pub provider: ProviderKind,
    /// API key (plaintext — prefer `api_key_env`).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key. When unset, a
    /// provider-specific default is used (`GEMINI_API_KEY` /
    /// `OPENAI_API_KEY`).
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Model identifier. When unset, the adapter's default is used.
    #[serde(default)]
    pub model: Option<String>,
    /// Provider base URL override (testing / proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "d_ticket_prompt")]
    pub ticket_summary_prompt: String,
    #[serde(default = "d_org_prompt")]
    pub org_summary_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: d_provider(),
            api_key: None,
            api_key_env: None,
            model: None,
            base_url: None,
            ticket_summary_prompt: d_ticket_prompt(),
            org_summary_prompt: d_org_prompt(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Updates applied before a workflow hands off to a new execution.
    #[serde(default = "d_500")]
    pub handoff_threshold: u32,
    /// Maximum per-ticket summary entries retained per organization.
    #[serde(default = "d_500usize")]
    pub max_ticket_summaries: usize,
    /// Byte budget for a ticket's accumulated comment batch.
    #[serde(default = "d_comment_bytes")]
    pub max_comment_bytes: usize,
    /// Start-to-close timeout per collaborator call, in milliseconds.
    #[serde(default = "d_30000")]
    pub call_timeout_ms: u64,
    /// Directory for workflow state snapshots. `None` keeps snapshots in
    /// memory only (they do not survive a process restart).
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handoff_threshold: 500,
            max_ticket_summaries: 500,
            max_comment_bytes: d_comment_bytes(),
            call_timeout_ms: 30_000,
            state_path: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential-backoff retry policy applied around collaborator calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "d_1000")]
    pub initial_interval_ms: u64,
    #[serde(default = "d_2_0")]
    pub backoff_coefficient: f64,
    #[serde(default = "d_60000")]
    pub max_interval_ms: u64,
    #[serde(default = "d_10")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            max_interval_ms: 60_000,
            max_attempts: 10,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Config {
    /// Check the configuration for problems without aborting on the first.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.helpdesk.subdomain.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "helpdesk.subdomain",
                message: "helpdesk subdomain is required".into(),
            });
        }
        if self.helpdesk.email.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "helpdesk.email",
                message: "helpdesk agent email is required".into(),
            });
        }
        if self.helpdesk.resolve_api_token().is_none() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "helpdesk.api_token",
                message: format!(
                    "no helpdesk API token configured (set {} or helpdesk.api_token)",
                    self.helpdesk.api_token_env
                ),
            });
        }
        if self.helpdesk.page_size == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "helpdesk.page_size",
                message: "page size must be greater than zero".into(),
            });
        }

        if self.engine.handoff_threshold == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "engine.handoff_threshold",
                message: "handoff threshold must be greater than zero".into(),
            });
        }
        if self.engine.retry.max_attempts == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "engine.retry.max_attempts",
                message: "retry policy needs at least one attempt".into(),
            });
        }
        if self.engine.retry.backoff_coefficient < 1.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "engine.retry.backoff_coefficient",
                message: "backoff coefficient below 1.0 shrinks intervals".into(),
            });
        }

        if self.llm.ticket_summary_prompt.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "llm.ticket_summary_prompt",
                message: "ticket summary prompt is empty".into(),
            });
        }
        if self.llm.org_summary_prompt.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "llm.org_summary_prompt",
                message: "organization summary prompt is empty".into(),
            });
        }

        issues
    }
}

// ── serde default helpers ──────────────────────────────────────────

fn d_host() -> String {
    "0.0.0.0".into()
}
fn d_8316() -> u16 {
    8316
}
fn d_token_env() -> String {
    "TICKETWISE_API_TOKEN".into()
}
fn d_helpdesk_token_env() -> String {
    "TICKETWISE_HELPDESK_TOKEN".into()
}
fn d_provider() -> ProviderKind {
    ProviderKind::Google
}
fn d_100() -> u32 {
    100
}
fn d_500() -> u32 {
    500
}
fn d_500usize() -> usize {
    500
}
fn d_comment_bytes() -> usize {
    400 * 1024
}
fn d_30000() -> u64 {
    30_000
}
fn d_1000() -> u64 {
    1_000
}
fn d_2_0() -> f64 {
    2.0
}
fn d_60000() -> u64 {
    60_000
}
fn d_10() -> u32 {
    10
}

fn d_ticket_prompt() -> String {
    "You are a support engineer summarizing one helpdesk ticket. Given the \
     ticket as JSON (metadata plus recent comments), respond with a JSON \
     object containing: \"summary\" (2-3 sentences of the current state), \
     \"sentiment\" (positive, neutral, or negative), and \"next_step\" \
     (the most useful follow-up action). Respond with JSON only."
        .into()
}

fn d_org_prompt() -> String {
    "You are a support lead reviewing one customer organization. Given the \
     organization as JSON (metadata plus per-ticket summaries), respond \
     with a JSON object containing: \"summary\" (an overview of open \
     themes across tickets), \"risks\" (notable escalation risks), and \
     \"health\" (good, fair, or poor). Respond with JSON only."
        .into()
}
