//! Organization summary queries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::state::AppState;

/// `GET /api/v1/organization/:id/summary` — the organization's last
/// committed aggregate summary. 404 when no workflow exists for the id.
///
/// The configured prompt asks the model for JSON; when the response (after
/// stripping a possible markdown code fence) parses, it is embedded as
/// structured JSON, otherwise the raw text is returned as a string.
pub async fn get_organization_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    let Some(org) = state.engine.organization(id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no workflow for organization {id}") })),
        )
            .into_response();
    };

    let summary = structured_summary(&org.summary);

    Json(serde_json::json!({
        "organization_id": org.id,
        "name": org.name,
        "ticket_count": org.ticket_summaries.len(),
        "summary": summary,
    }))
    .into_response()
}

fn structured_summary(raw: &str) -> serde_json::Value {
    let stripped = strip_code_fences(raw);
    serde_json::from_str(stripped)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Drop a surrounding markdown code fence (```json ... ``` or ``` ... ```)
/// if present; models routinely wrap JSON answers in one.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // The opening fence may carry a language tag on its own line.
    match rest.split_once('\n') {
        Some((first_line, body)) if !first_line.trim().contains(' ') => body.trim(),
        _ => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        let value = structured_summary(r#"{"health": "good"}"#);
        assert_eq!(value["health"], "good");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"health\": \"fair\", \"risks\": []}\n```";
        let value = structured_summary(raw);
        assert_eq!(value["health"], "fair");
    }

    #[test]
    fn fence_without_language_tag_is_unwrapped() {
        let raw = "```\n{\"health\": \"poor\"}\n```";
        let value = structured_summary(raw);
        assert_eq!(value["health"], "poor");
    }

    #[test]
    fn prose_falls_back_to_a_string() {
        let value = structured_summary("Things are mostly fine.");
        assert_eq!(value, serde_json::Value::String("Things are mostly fine.".into()));
    }

    #[test]
    fn strip_is_lossless_for_unfenced_text() {
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }
}
