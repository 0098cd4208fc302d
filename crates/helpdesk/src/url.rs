//! Ticket URL parsing.

use std::sync::OnceLock;

use regex::Regex;
use tw_domain::error::{Error, Result};

fn ticket_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/tickets/(\d+)").unwrap())
}

/// Extract the ticket id from any helpdesk URL containing a
/// `/tickets/<id>` path segment.
///
/// Accepts both agent-facing and API URLs, with or without a trailing
/// `.json` suffix or query string.
pub fn parse_ticket_url(url: &str) -> Result<i64> {
    let caps = ticket_path_re()
        .captures(url)
        .ok_or_else(|| Error::InvalidArgument(format!("no ticket id in URL: {url}")))?;
    caps[1]
        .parse::<i64>()
        .map_err(|_| Error::InvalidArgument(format!("ticket id out of range in URL: {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_url() {
        let id = parse_ticket_url("https://acme.zendesk.com/agent/tickets/12345").unwrap();
        assert_eq!(id, 12345);
    }

    #[test]
    fn parses_api_url_with_json_suffix() {
        let id = parse_ticket_url("https://acme.zendesk.com/api/v2/tickets/67890.json").unwrap();
        assert_eq!(id, 67890);
    }

    #[test]
    fn parses_url_with_query_string() {
        let id = parse_ticket_url("https://acme.zendesk.com/agent/tickets/42?comment=1").unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn rejects_url_without_ticket_segment() {
        let err = parse_ticket_url("https://acme.zendesk.com/agent/organizations/9").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_non_numeric_id() {
        assert!(parse_ticket_url("https://acme.zendesk.com/tickets/abc").is_err());
    }
}
