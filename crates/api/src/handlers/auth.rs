//! Handlers for the `/auth` resource (Telegram login, dev login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use classiklust_core::error::CoreError;
use classiklust_core::session::{generate_session_token, sanitize_dev_handle};
use classiklust_core::telegram::validate_init_data;
use classiklust_core::types::DbId;
use classiklust_db::models::player::{CreatePlayer, Player};
use classiklust_db::models::session::CreateSession;
use classiklust_db::repositories::{PlayerRepo, SessionRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthPlayer;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramLoginRequest {
    pub init_data: String,
}

#[derive(Debug, Deserialize)]
pub struct DevLoginRequest {
    pub username: String,
}

/// Returned by both login flows. The token is only ever shown here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub player: Player,
    pub session_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/telegram
///
/// Validate Telegram WebApp `initData` and start a session for the embedded
/// user, creating the player on first login.
pub async fn telegram_login(
    State(state): State<AppState>,
    Json(input): Json<TelegramLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let bot_token = state.config.telegram_bot_token.as_deref().ok_or_else(|| {
        AppError::ServiceUnavailable("Telegram login is not configured".into())
    })?;

    let verified = validate_init_data(
        &input.init_data,
        bot_token,
        Duration::seconds(state.config.telegram_auth_max_age_secs),
        Utc::now(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected Telegram initData");
        AppError::Core(CoreError::Unauthorized(e.to_string()))
    })?;

    let player = PlayerRepo::create_or_get(
        &state.pool,
        &CreatePlayer {
            telegram_id: Some(verified.user.id.to_string()),
            dev_handle: None,
            username: verified.user.display_name(),
            is_admin: false,
        },
    )
    .await?;

    let session_token = issue_session(&state, player.id).await?;
    tracing::info!(player_id = player.id, telegram_id = verified.user.id, "Telegram login");

    Ok(Json(AuthResponse {
        success: true,
        player,
        session_token,
    }))
}

/// POST /api/auth/dev
///
/// Username-only login for local development. Disabled in production.
pub async fn dev_login(
    State(state): State<AppState>,
    Json(input): Json<DevLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    if state.config.app_env.is_production() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Dev login is disabled in production".into(),
        )));
    }

    let handle = sanitize_dev_handle(&input.username).ok_or_else(|| {
        AppError::Core(CoreError::Validation(
            "username must contain at least one of [a-z0-9_]".into(),
        ))
    })?;

    let player = PlayerRepo::create_or_get(
        &state.pool,
        &CreatePlayer {
            telegram_id: None,
            dev_handle: Some(handle.clone()),
            username: handle,
            is_admin: false,
        },
    )
    .await?;

    let session_token = issue_session(&state, player.id).await?;
    tracing::info!(player_id = player.id, "Dev login");

    Ok(Json(AuthResponse {
        success: true,
        player,
        session_token,
    }))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, auth: AuthPlayer) -> AppResult<StatusCode> {
    SessionRepo::delete(&state.pool, auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/logout-all
///
/// End every session of the caller, including the one making the request.
pub async fn logout_all(State(state): State<AppState>, auth: AuthPlayer) -> AppResult<StatusCode> {
    let ended = SessionRepo::delete_all_for_player(&state.pool, auth.player.id).await?;
    tracing::info!(player_id = auth.player.id, ended, "Logged out everywhere");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn issue_session(state: &AppState, player_id: DbId) -> AppResult<String> {
    let token = generate_session_token();
    SessionRepo::create(
        &state.pool,
        &CreateSession {
            player_id,
            token_hash: token.hash,
            expires_at: Utc::now() + Duration::days(state.config.session_ttl_days),
        },
    )
    .await?;
    Ok(token.plaintext)
}
