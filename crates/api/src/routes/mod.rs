pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod lunabug;
pub mod media;
pub mod player;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/telegram                          Telegram Mini App login (public)
/// /auth/dev                               dev login, non-production only
/// /auth/logout                            delete session (bearer)
///
/// /player/me                              get, patch own player (bearer)
/// /player/tap                             tap (bearer)
/// /player/upgrades                        purchase upgrade level (bearer)
/// /player/level-up                        advance one level (bearer)
///
/// /upgrades, /characters, /levels         visible catalog (bearer)
///
/// /admin/{upgrades,characters,levels}     list, upsert (admin)
/// /admin/{kind}/{id}                      get, patch, delete (admin)
/// /admin/resync                           re-run game-data sync (admin)
/// /admin/reconcile                        rewrite JSON mirrors (admin)
///
/// /media                                  list (public), upload (admin)
/// /media/{id}                             patch, delete (admin)
///
/// /lunabug/{ai,debug,chat}                LLM proxy
/// /lunabug/status                         provider breaker status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/player", player::router())
        // Catalog reads sit at the API root.
        .merge(catalog::router())
        .nest("/admin", admin::router())
        .nest("/media", media::router())
        .nest("/lunabug", lunabug::router())
}
