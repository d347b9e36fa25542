//! Admin authorization extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use classiklust_core::error::CoreError;
use classiklust_core::hashing::constant_time_eq;
use classiklust_core::types::DbId;

use super::auth::AuthPlayer;
use crate::error::AppError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Who was let through as an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminIdentity {
    /// The shared `ADMIN_TOKEN` secret.
    Token,
    /// A player session with `is_admin` set.
    Player(DbId),
}

/// Requires admin rights: either an `x-admin-token` header matching
/// `ADMIN_TOKEN`, or a bearer session whose player is an admin.
///
/// A present but wrong admin token is rejected with 403 without falling
/// back to the session.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(who): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AdminIdentity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(presented) = parts.headers.get(ADMIN_TOKEN_HEADER) {
            let valid = match (&state.config.admin_token, presented.to_str()) {
                (Some(expected), Ok(presented)) => {
                    constant_time_eq(expected.as_bytes(), presented.as_bytes())
                }
                _ => false,
            };
            if !valid {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Invalid admin token".into(),
                )));
            }
            return Ok(RequireAdmin(AdminIdentity::Token));
        }

        let auth = AuthPlayer::from_request_parts(parts, state).await?;
        if !auth.player.is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin access required".into(),
            )));
        }
        Ok(RequireAdmin(AdminIdentity::Player(auth.player.id)))
    }
}
