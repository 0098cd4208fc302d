use std::sync::Arc;

use tw_domain::config::Config;
use tw_engine::Engine;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
    /// SHA-256 digest of the inbound API token. `None` means no token is
    /// configured and protected routes are open (dev mode).
    pub api_token_hash: Option<[u8; 32]>,
}
