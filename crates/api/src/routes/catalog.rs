use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Player-facing catalog reads, merged at the API root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upgrades", get(catalog::list_upgrades))
        .route("/characters", get(catalog::list_characters))
        .route("/levels", get(catalog::list_levels))
}
