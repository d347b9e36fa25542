//! Session-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use classiklust_core::error::CoreError;
use classiklust_core::session::hash_session_token;
use classiklust_core::types::DbId;
use classiklust_db::models::player::Player;
use classiklust_db::repositories::{PlayerRepo, SessionRepo};

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated player resolved from an opaque `Bearer` session token.
///
/// Expired sessions are deleted on sight and rejected with 401.
///
/// ```ignore
/// async fn my_handler(auth: AuthPlayer) -> AppResult<Json<()>> {
///     tracing::info!(player_id = auth.player.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPlayer {
    pub player: Player,
    pub session_id: DbId,
}

impl FromRequestParts<AppState> for AuthPlayer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let session = SessionRepo::find_by_token_hash(&state.pool, &hash_session_token(token))
            .await?
            .ok_or_else(|| unauthorized("Invalid session token"))?;

        if session.is_expired_at(Utc::now()) {
            SessionRepo::delete(&state.pool, session.id).await?;
            tracing::debug!(session_id = session.id, "Deleted expired session");
            return Err(unauthorized("Session expired"));
        }

        let player = PlayerRepo::find_by_id(&state.pool, session.player_id)
            .await?
            .ok_or_else(|| unauthorized("Session player no longer exists"))?;

        Ok(AuthPlayer {
            player,
            session_id: session.id,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}
