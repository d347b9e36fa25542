//! Handlers for `/admin`: catalog CRUD through the dual-write persister,
//! resync, mirror reconciliation and player administration.
//!
//! The CRUD handlers are generic over the catalog kind and instantiated once
//! per kind in `routes::admin`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use classiklust_core::catalog::{
    Character, EntityKind, Level, UpdateCharacter, UpdateLevel, UpdateUpgrade, Upgrade,
};
use classiklust_core::error::CoreError;
use classiklust_core::types::DbId;
use classiklust_db::models::player::Player;
use classiklust_db::repositories::{PlayerRepo, SessionRepo};
use classiklust_gamedata::{
    DeleteOutcome, GameEntity, MirrorStatus, PgCatalogStore, RecordStore, SyncReport,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, WriteResponse};
use crate::state::AppState;

/// A catalog kind editable through the admin API.
pub trait AdminResource: GameEntity {
    /// Partial-update body for `PATCH /admin/{kind}/{id}`.
    type Patch: DeserializeOwned + Send + 'static;

    fn apply_patch(patch: Self::Patch, target: &mut Self);
}

impl AdminResource for Upgrade {
    type Patch = UpdateUpgrade;

    fn apply_patch(patch: UpdateUpgrade, target: &mut Self) {
        patch.apply(target);
    }
}

impl AdminResource for Character {
    type Patch = UpdateCharacter;

    fn apply_patch(patch: UpdateCharacter, target: &mut Self) {
        patch.apply(target);
    }
}

impl AdminResource for Level {
    type Patch = UpdateLevel;

    fn apply_patch(patch: UpdateLevel, target: &mut Self) {
        patch.apply(target);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileEntry {
    pub kind: EntityKind,
    pub mirror: MirrorStatus,
}

// ---------------------------------------------------------------------------
// Generic CRUD
// ---------------------------------------------------------------------------

/// GET /api/admin/{kind} -- every record, hidden ones included.
pub async fn list<T>(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<T>>>
where
    T: AdminResource,
{
    Json(DataResponse {
        data: state.game_data.list::<T>().await,
    })
}

/// GET /api/admin/{kind}/{id}
pub async fn get_one<T>(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<T::Key>,
) -> AppResult<Json<DataResponse<T>>>
where
    T: AdminResource,
{
    let record = state
        .game_data
        .get::<T>(&key)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found(T::KIND.entity_name(), &key)))?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/admin/{kind} -- create or replace by id.
///
/// Returns 201 for a new record and 200 for a replacement.
pub async fn upsert<T>(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Json(record): Json<T>,
) -> AppResult<(StatusCode, Json<WriteResponse<T>>)>
where
    T: AdminResource,
    PgCatalogStore: RecordStore<T>,
{
    let outcome = state.game_data.save(record).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(WriteResponse {
            warnings: outcome.mirror.warning().into_iter().collect(),
            data: outcome.record,
        }),
    ))
}

/// PATCH /api/admin/{kind}/{id}
pub async fn patch<T>(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<T::Key>,
    Json(patch): Json<T::Patch>,
) -> AppResult<Json<WriteResponse<T>>>
where
    T: AdminResource,
    PgCatalogStore: RecordStore<T>,
{
    let outcome = state
        .game_data
        .update::<T, _>(&key, move |record| T::apply_patch(patch, record))
        .await?;
    Ok(Json(WriteResponse {
        warnings: outcome.mirror.warning().into_iter().collect(),
        data: outcome.record,
    }))
}

/// DELETE /api/admin/{kind}/{id}
pub async fn delete<T>(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<T::Key>,
) -> AppResult<Json<WriteResponse<DeleteOutcome>>>
where
    T: AdminResource,
    PgCatalogStore: RecordStore<T>,
{
    let outcome = state.game_data.delete::<T>(&key).await?;
    Ok(Json(WriteResponse {
        warnings: outcome.mirror.warning().into_iter().collect(),
        data: outcome,
    }))
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

/// POST /api/admin/resync -- reload every kind from the data sources.
pub async fn resync(
    RequireAdmin(who): RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<SyncReport>> {
    tracing::info!(admin = ?who, "Admin resync requested");
    Json(DataResponse {
        data: state.game_data.sync_all().await,
    })
}

/// POST /api/admin/reconcile -- rewrite every JSON mirror from the cache.
pub async fn reconcile(
    RequireAdmin(who): RequireAdmin,
    State(state): State<AppState>,
) -> Json<WriteResponse<Vec<ReconcileEntry>>> {
    tracing::info!(admin = ?who, "Admin reconcile requested");
    let entries: Vec<ReconcileEntry> = state
        .game_data
        .reconcile_all()
        .await
        .into_iter()
        .map(|(kind, mirror)| ReconcileEntry { kind, mirror })
        .collect();
    let warnings = entries.iter().filter_map(|e| e.mirror.warning()).collect();
    Json(WriteResponse {
        data: entries,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

/// GET /api/admin/players/telegram/{telegram_id}
pub async fn find_player_by_telegram_id(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(telegram_id): Path<String>,
) -> AppResult<Json<DataResponse<Player>>> {
    let player = PlayerRepo::find_by_telegram_id(&state.pool, &telegram_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Player", &telegram_id)))?;
    Ok(Json(DataResponse { data: player }))
}

/// PUT /api/admin/players/{id}/admin
///
/// Revoking the flag also ends the player's sessions, so an open session
/// cannot keep admin rights cached in a client.
pub async fn set_player_admin(
    RequireAdmin(who): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetAdminRequest>,
) -> AppResult<Json<DataResponse<Player>>> {
    if !PlayerRepo::set_admin(&state.pool, id, input.is_admin).await? {
        return Err(AppError::Core(CoreError::not_found("Player", id)));
    }
    if !input.is_admin {
        let ended = SessionRepo::delete_all_for_player(&state.pool, id).await?;
        tracing::info!(player_id = id, ended, "Ended sessions of demoted admin");
    }
    tracing::info!(admin = ?who, player_id = id, is_admin = input.is_admin, "Player admin flag changed");

    let player = PlayerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Player", id)))?;
    Ok(Json(DataResponse { data: player }))
}
