//! API authentication middleware.
//!
//! The inbound API token is resolved **once at startup** (config field or
//! the env var named by `server.api_token_env`, default
//! `TICKETWISE_API_TOKEN`) and cached in `AppState` as a SHA-256 digest.
//! - When a token is configured, every protected request must carry it in
//!   the `X-Ticketwise-Key` header.
//! - When none is configured, the server logs a warning once at startup
//!   and allows unauthenticated access (dev mode).

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::AppState;

/// Header the helpdesk webhook (and any other caller) authenticates with.
pub const API_KEY_HEADER: &str = "X-Ticketwise-Key";

/// Axum middleware enforcing the API key on protected routes. Attach via
/// `axum::middleware::from_fn_with_state`.
pub async fn require_api_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected_hash = match &state.api_token_hash {
        Some(h) => h,
        None => return next.run(req).await,
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Hash the provided token to a fixed-length digest, then compare in
    // constant time. This avoids leaking the token length.
    let provided_hash = Sha256::digest(provided.as_bytes());

    if !bool::from(provided_hash.ct_eq(expected_hash.as_slice())) {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "invalid or missing API key" })),
        )
            .into_response();
    }

    next.run(req).await
}

/// Digest a configured token for caching in `AppState`.
pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
