//! Player-facing catalog reads, served from the in-memory cache.

use axum::extract::State;
use axum::Json;
use classiklust_core::catalog::{Character, Level, Upgrade};

use crate::middleware::auth::AuthPlayer;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/upgrades -- visible upgrades only.
pub async fn list_upgrades(
    State(state): State<AppState>,
    _auth: AuthPlayer,
) -> Json<DataResponse<Vec<Upgrade>>> {
    let mut upgrades = state.game_data.list::<Upgrade>().await;
    upgrades.retain(|u| !u.is_hidden);
    Json(DataResponse { data: upgrades })
}

/// GET /api/characters -- visible characters only.
pub async fn list_characters(
    State(state): State<AppState>,
    _auth: AuthPlayer,
) -> Json<DataResponse<Vec<Character>>> {
    let mut characters = state.game_data.list::<Character>().await;
    characters.retain(|c| !c.is_hidden);
    Json(DataResponse { data: characters })
}

/// GET /api/levels
pub async fn list_levels(
    State(state): State<AppState>,
    _auth: AuthPlayer,
) -> Json<DataResponse<Vec<Level>>> {
    Json(DataResponse {
        data: state.game_data.list::<Level>().await,
    })
}
