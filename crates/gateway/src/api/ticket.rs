//! Ticket ingestion and summary queries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use tw_engine::ticket_workflow_id;
use tw_helpdesk::parse_ticket_url;

use crate::state::AppState;

/// Payload the helpdesk trigger posts to the webhook endpoint.
#[derive(Debug, Deserialize)]
pub struct TicketWebhookRequest {
    pub ticket_url: String,
}

/// `POST /api/v1/ticket` — queue a re-process of the referenced ticket.
///
/// Responds as soon as the signal is accepted; summarization happens in
/// the ticket's workflow.
pub async fn upsert_ticket(
    State(state): State<AppState>,
    Json(body): Json<TicketWebhookRequest>,
) -> Response {
    let ticket_id = match parse_ticket_url(&body.ticket_url) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!(url = %body.ticket_url, error = %err, "webhook carried no usable ticket URL");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    if let Err(err) = state.engine.upsert_ticket(ticket_id) {
        tracing::error!(ticket = ticket_id, error = %err, "ticket signal rejected");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "message": format!("upsert queued for ticket {ticket_id}"),
            "workflow_id": ticket_workflow_id(ticket_id),
        })),
    )
        .into_response()
}

/// `GET /api/v1/ticket/:id/summary` — the ticket's last committed
/// summary, empty until the first generation cycle finishes. 404 when no
/// workflow exists for the id.
pub async fn get_ticket_summary(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let Some(ticket) = state.engine.ticket(id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no workflow for ticket {id}") })),
        )
            .into_response();
    };

    let mut body = serde_json::json!({ "summary": ticket.summary });
    if let Some(last_error) = state.engine.ticket_error(id) {
        body["last_error"] = serde_json::Value::String(last_error);
    }
    Json(body).into_response()
}
