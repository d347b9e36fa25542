use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    pub catalog: CatalogCounts,
}

#[derive(Serialize)]
pub struct CatalogCounts {
    pub upgrades: usize,
    pub characters: usize,
    pub levels: usize,
}

/// GET /health -- returns service and database health.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = classiklust_db::health_check(&state.pool).await.is_ok();
    let status = if db_healthy { "ok" } else { "degraded" };

    let cache = state.game_data.cache();
    let catalog = CatalogCounts {
        upgrades: cache.upgrades.len().await,
        characters: cache.characters.len().await,
        levels: cache.levels.len().await,
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        catalog,
    })
}
