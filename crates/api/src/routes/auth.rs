//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /telegram  -> telegram_login
/// POST /dev       -> dev_login (non-production)
/// POST /logout    -> logout (requires auth)
/// POST /logout-all -> logout_all (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/telegram", post(auth::telegram_login))
        .route("/dev", post(auth::dev_login))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
}
