pub mod auth;
pub mod health;
pub mod organization;
pub mod ticket;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (the health probe) and **protected**
/// (gated behind the `X-Ticketwise-Key` middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health::health));

    let protected = Router::new()
        .route("/api/v1/ticket", post(ticket::upsert_ticket))
        .route("/api/v1/ticket/:id/summary", get(ticket::get_ticket_summary))
        .route(
            "/api/v1/organization/:id/summary",
            get(organization::get_organization_summary),
        )
        .layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}
