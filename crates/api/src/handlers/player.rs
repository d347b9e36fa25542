//! Handlers for the `/player` resource.
//!
//! Every gameplay mutation runs in one transaction holding the player row
//! lock (`SELECT ... FOR UPDATE`), so concurrent requests for the same player
//! apply one after another. Passive income and energy regeneration are
//! settled at the start of each operation.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use classiklust_core::catalog::{Character, Level, Upgrade};
use classiklust_core::error::CoreError;
use classiklust_core::game::GameState;
use classiklust_core::types::{DbId, Timestamp};
use classiklust_db::models::player::{Player, PlayerProgress, UpdatePlayerProfile};
use classiklust_db::repositories::{PlayerRepo, PlayerUpgradeRepo};
use classiklust_gamedata::snapshot::PlayerSnapshotWriter;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthPlayer;
use crate::state::AppState;

const MAX_USERNAME_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseUpgradeRequest {
    pub upgrade_id: String,
    pub level: i32,
}

/// Player state plus the result of the operation that produced it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse<R: Serialize = ()> {
    pub player: Player,
    /// upgrade id -> owned level
    pub upgrades: HashMap<String, i32>,
    /// Passive income credited while settling this request.
    pub passive_earned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapResult {
    pub points_earned: i64,
    pub per_tap: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub upgrade_id: String,
    pub new_level: i32,
    pub cost: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpResult {
    pub new_level: i32,
    pub cost: i64,
    pub newly_unlocked: Vec<String>,
}

/// Catalog copied out of the cache for one operation.
struct CatalogSnapshot {
    upgrades: Vec<Upgrade>,
    characters: Vec<Character>,
    levels: Vec<Level>,
}

impl CatalogSnapshot {
    async fn load(state: &AppState) -> Self {
        Self {
            upgrades: state.game_data.list::<Upgrade>().await,
            characters: state.game_data.list::<Character>().await,
            levels: state.game_data.list::<Level>().await,
        }
    }
}

/// What an operation did besides changing the player row.
struct OpEffect<R> {
    result: R,
    /// `(upgrade_id, level)` to write to `player_upgrades`.
    upgrade_change: Option<(String, i32)>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/player/me
pub async fn me(State(state): State<AppState>, auth: AuthPlayer) -> AppResult<Json<PlayerResponse>> {
    let response = run_player_op(&state, auth.player.id, |_, _| {
        Ok(OpEffect {
            result: (),
            upgrade_change: None,
        })
    })
    .await?;
    Ok(Json(PlayerResponse {
        result: None,
        ..response
    }))
}

/// PATCH /api/player/me
///
/// Only `username` and `selectedCharacterId` may be changed here; gameplay
/// fields move through the gameplay endpoints.
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthPlayer,
    Json(mut input): Json<UpdatePlayerProfile>,
) -> AppResult<Json<PlayerResponse>> {
    if let Some(username) = input.username.as_mut() {
        *username = username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AppError::Core(CoreError::Validation(format!(
                "username must be 1-{MAX_USERNAME_LENGTH} characters"
            ))));
        }
    }

    if let Some(character_id) = input.selected_character_id.as_deref() {
        let exists = state
            .game_data
            .get::<Character>(&character_id.to_string())
            .await
            .is_some();
        if !exists {
            return Err(AppError::Core(CoreError::not_found("Character", character_id)));
        }
        if !auth.player.unlocked_characters.iter().any(|c| c == character_id) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Character {character_id} is not unlocked"
            ))));
        }
    }

    let player = PlayerRepo::update_profile(&state.pool, auth.player.id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Player", auth.player.id)))?;
    let upgrades = PlayerUpgradeRepo::level_map(&state.pool, player.id).await?;
    write_snapshot(&state, &player, &upgrades).await;

    Ok(Json(PlayerResponse {
        player,
        upgrades,
        passive_earned: 0,
        result: None,
    }))
}

/// POST /api/player/tap
pub async fn tap(
    State(state): State<AppState>,
    auth: AuthPlayer,
    Json(input): Json<TapRequest>,
) -> AppResult<Json<PlayerResponse<TapResult>>> {
    let response = run_player_op(&state, auth.player.id, |game, catalog| {
        let outcome = game.tap(input.count, &catalog.upgrades)?;
        Ok(OpEffect {
            result: TapResult {
                points_earned: outcome.points_earned,
                per_tap: outcome.per_tap,
            },
            upgrade_change: None,
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/player/upgrades
pub async fn purchase_upgrade(
    State(state): State<AppState>,
    auth: AuthPlayer,
    Json(input): Json<PurchaseUpgradeRequest>,
) -> AppResult<Json<PlayerResponse<PurchaseResult>>> {
    let response = run_player_op(&state, auth.player.id, |game, catalog| {
        let upgrade = catalog
            .upgrades
            .iter()
            .find(|u| u.id == input.upgrade_id && !u.is_hidden)
            .ok_or_else(|| AppError::Core(CoreError::not_found("Upgrade", &input.upgrade_id)))?;
        let outcome = game.purchase_upgrade(upgrade, input.level, &catalog.upgrades)?;
        Ok(OpEffect {
            upgrade_change: Some((outcome.upgrade_id.clone(), outcome.new_level)),
            result: PurchaseResult {
                upgrade_id: outcome.upgrade_id,
                new_level: outcome.new_level,
                cost: outcome.cost,
            },
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/player/level-up
pub async fn level_up(
    State(state): State<AppState>,
    auth: AuthPlayer,
) -> AppResult<Json<PlayerResponse<LevelUpResult>>> {
    let response = run_player_op(&state, auth.player.id, |game, catalog| {
        let next = catalog.levels.iter().find(|l| l.level == game.level + 1);
        let outcome = game.level_up(next, &catalog.characters)?;
        Ok(OpEffect {
            result: LevelUpResult {
                new_level: outcome.new_level,
                cost: outcome.cost,
                newly_unlocked: outcome.newly_unlocked,
            },
            upgrade_change: None,
        })
    })
    .await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock the player row, settle the tick, apply `op` and persist the result.
/// An error from `op` rolls the transaction back.
async fn run_player_op<R, F>(state: &AppState, player_id: DbId, op: F) -> AppResult<PlayerResponse<R>>
where
    R: Serialize,
    F: FnOnce(&mut GameState, &CatalogSnapshot) -> AppResult<OpEffect<R>>,
{
    let catalog = CatalogSnapshot::load(state).await;
    let now: Timestamp = Utc::now();

    let mut tx = state.pool.begin().await?;
    let player = PlayerRepo::find_for_update(&mut *tx, player_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Player", player_id)))?;
    let owned = PlayerUpgradeRepo::level_map(&mut *tx, player_id).await?;

    let mut game = player.game_state(owned);
    let tick = game.tick(now);
    game.recompute_stats(&catalog.upgrades);

    let effect = op(&mut game, &catalog)?;
    if let Some((upgrade_id, level)) = &effect.upgrade_change {
        PlayerUpgradeRepo::upsert(&mut *tx, player_id, upgrade_id, *level).await?;
    }
    let player = PlayerRepo::save_progress(&mut *tx, player_id, &PlayerProgress::from(&game)).await?;
    tx.commit().await?;

    write_snapshot(state, &player, &game.upgrades).await;

    Ok(PlayerResponse {
        player,
        upgrades: game.upgrades,
        passive_earned: tick.points_earned,
        result: Some(effect.result),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerSnapshot<'a> {
    player: &'a Player,
    upgrades: &'a HashMap<String, i32>,
    saved_at: Timestamp,
}

/// Best effort: the database already holds the committed state.
async fn write_snapshot(state: &AppState, player: &Player, upgrades: &HashMap<String, i32>) {
    let folder = PlayerSnapshotWriter::folder_for(
        player.telegram_id.as_deref(),
        player.dev_handle.as_deref(),
        player.id,
    );
    let snapshot = PlayerSnapshot {
        player,
        upgrades,
        saved_at: Utc::now(),
    };
    if let Err(e) = state.snapshots.write(&folder, &snapshot).await {
        tracing::warn!(player_id = player.id, error = %e, "Failed to write player snapshot");
    }
}
