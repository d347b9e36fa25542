//! Repository for the `player_upgrades` table.

use std::collections::HashMap;

use classiklust_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::player::PlayerUpgrade;

const COLUMNS: &str = "player_id, upgrade_id, level, updated_at";

/// Owned upgrade levels per player. One row per (player, upgrade), enforced
/// by `uq_player_upgrades_player_upgrade`.
pub struct PlayerUpgradeRepo;

impl PlayerUpgradeRepo {
    /// List a player's owned upgrades ordered by upgrade id.
    pub async fn list_for_player<'e, E>(
        executor: E,
        player_id: DbId,
    ) -> Result<Vec<PlayerUpgrade>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM player_upgrades WHERE player_id = $1 ORDER BY upgrade_id"
        );
        sqlx::query_as::<_, PlayerUpgrade>(&query)
            .bind(player_id)
            .fetch_all(executor)
            .await
    }

    /// Owned levels as an `upgrade_id -> level` map.
    pub async fn level_map<'e, E>(
        executor: E,
        player_id: DbId,
    ) -> Result<HashMap<String, i32>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = Self::list_for_player(executor, player_id).await?;
        Ok(rows.into_iter().map(|r| (r.upgrade_id, r.level)).collect())
    }

    /// Insert or update the owned level for one upgrade.
    pub async fn upsert<'e, E>(
        executor: E,
        player_id: DbId,
        upgrade_id: &str,
        level: i32,
    ) -> Result<PlayerUpgrade, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO player_upgrades (player_id, upgrade_id, level)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_player_upgrades_player_upgrade
             DO UPDATE SET level = EXCLUDED.level
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlayerUpgrade>(&query)
            .bind(player_id)
            .bind(upgrade_id)
            .bind(level)
            .fetch_one(executor)
            .await
    }
}
