//! Route definitions for the `/player` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::player;
use crate::state::AppState;

/// Routes mounted at `/player`. Every route requires a bearer session.
///
/// ```text
/// GET   /me        -> me
/// PATCH /me        -> update_me
/// POST  /tap       -> tap
/// POST  /upgrades  -> purchase_upgrade
/// POST  /level-up  -> level_up
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(player::me).patch(player::update_me))
        .route("/tap", post(player::tap))
        .route("/upgrades", post(player::purchase_upgrade))
        .route("/level-up", post(player::level_up))
}
