use std::sync::Arc;

use classiklust_gamedata::snapshot::PlayerSnapshotWriter;
use classiklust_gamedata::{GameData, PgCatalogStore};
use classiklust_lunabug::LunaBug;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: classiklust_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Catalog cache plus the dual-write persister.
    pub game_data: Arc<GameData<PgCatalogStore>>,
    pub snapshots: Arc<PlayerSnapshotWriter>,
    pub lunabug: Arc<LunaBug>,
}
