//! Defaults and parsing behavior for the TOML configuration.

use tw_domain::config::{Config, ConfigSeverity, ProviderKind};

#[test]
fn empty_config_gets_full_defaults() {
    let config: Config = toml::from_str("").expect("empty config should parse");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8316);
    assert_eq!(config.llm.provider, ProviderKind::Google);
    assert_eq!(config.engine.handoff_threshold, 500);
    assert_eq!(config.engine.max_ticket_summaries, 500);
    assert_eq!(config.engine.max_comment_bytes, 400 * 1024);
    assert_eq!(config.engine.retry.max_attempts, 10);
    assert_eq!(config.engine.retry.initial_interval_ms, 1_000);
    assert!(!config.llm.ticket_summary_prompt.is_empty());
}

#[test]
fn partial_sections_keep_sibling_defaults() {
    let raw = r#"
        [helpdesk]
        subdomain = "acme"
        email = "agent@acme.test"

        [llm]
        provider = "openai"
        model = "gpt-4o-mini"

        [engine]
        handoff_threshold = 50
    "#;
    let config: Config = toml::from_str(raw).expect("config should parse");

    assert_eq!(config.helpdesk.subdomain, "acme");
    assert_eq!(config.helpdesk.page_size, 100);
    assert_eq!(config.llm.provider, ProviderKind::Openai);
    assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(config.engine.handoff_threshold, 50);
    assert_eq!(config.engine.retry.backoff_coefficient, 2.0);
}

#[test]
fn validate_flags_missing_helpdesk_identity() {
    let config = Config::default();
    let issues = config.validate();

    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .collect();
    assert!(errors.iter().any(|i| i.field == "helpdesk.subdomain"));
    assert!(errors.iter().any(|i| i.field == "helpdesk.email"));
}

#[test]
fn validate_rejects_zero_handoff_threshold() {
    let raw = r#"
        [helpdesk]
        subdomain = "acme"
        email = "agent@acme.test"

        [engine]
        handoff_threshold = 0
    "#;
    let config: Config = toml::from_str(raw).expect("config should parse");
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "engine.handoff_threshold" && i.severity == ConfigSeverity::Error));
}
