//! Route definitions for the `/lunabug` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::lunabug;
use crate::state::AppState;

/// Routes mounted at `/lunabug`. No authentication.
///
/// ```text
/// POST /ai      -> ai
/// POST /debug   -> debug
/// POST /chat    -> chat
/// GET  /status  -> status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai", post(lunabug::ai))
        .route("/debug", post(lunabug::debug))
        .route("/chat", post(lunabug::chat))
        .route("/status", get(lunabug::status))
}
