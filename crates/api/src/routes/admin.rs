//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;
use classiklust_core::catalog::{Character, Level, Upgrade};

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require admin rights (enforced by the `RequireAdmin` extractor).
///
/// ```text
/// GET    /upgrades             -> list
/// POST   /upgrades             -> upsert
/// GET    /upgrades/{id}        -> get_one
/// PATCH  /upgrades/{id}        -> patch
/// DELETE /upgrades/{id}        -> delete
/// (same for /characters/{id} and /levels/{level})
/// POST   /resync               -> resync
/// POST   /reconcile            -> reconcile
/// GET    /players/telegram/{telegram_id} -> find_player_by_telegram_id
/// PUT    /players/{id}/admin   -> set_player_admin
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upgrades",
            get(admin::list::<Upgrade>).post(admin::upsert::<Upgrade>),
        )
        .route(
            "/upgrades/{id}",
            get(admin::get_one::<Upgrade>)
                .patch(admin::patch::<Upgrade>)
                .delete(admin::delete::<Upgrade>),
        )
        .route(
            "/characters",
            get(admin::list::<Character>).post(admin::upsert::<Character>),
        )
        .route(
            "/characters/{id}",
            get(admin::get_one::<Character>)
                .patch(admin::patch::<Character>)
                .delete(admin::delete::<Character>),
        )
        .route(
            "/levels",
            get(admin::list::<Level>).post(admin::upsert::<Level>),
        )
        .route(
            "/levels/{level}",
            get(admin::get_one::<Level>)
                .patch(admin::patch::<Level>)
                .delete(admin::delete::<Level>),
        )
        .route("/resync", post(admin::resync))
        .route("/reconcile", post(admin::reconcile))
        .route(
            "/players/telegram/{telegram_id}",
            get(admin::find_player_by_telegram_id),
        )
        .route("/players/{id}/admin", put(admin::set_player_admin))
}
