//! `config validate` and `config show` subcommands.

use tw_domain::config::{Config, ConfigSeverity};

/// Print every configuration issue. Returns `false` when any is an error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();
    if issues.is_empty() {
        println!("{config_path}: OK");
        return true;
    }

    let mut has_errors = false;
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Error => {
                has_errors = true;
                println!("error: {issue}");
            }
            ConfigSeverity::Warning => println!("warning: {issue}"),
        }
    }
    println!(
        "{config_path}: {} issue(s), {} error(s)",
        issues.len(),
        issues
            .iter()
            .filter(|i| i.severity == ConfigSeverity::Error)
            .count()
    );
    !has_errors
}

/// Dump the resolved configuration, defaults included. Secrets stay in
/// env vars, so nothing sensitive is printed.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(raw) => println!("{raw}"),
        Err(e) => eprintln!("could not serialize config: {e}"),
    }
}
