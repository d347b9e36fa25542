//! Repository for the `players` table.

use classiklust_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::player::{CreatePlayer, Player, PlayerProgress, UpdatePlayerProfile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, telegram_id, dev_handle, username, points, energy, max_energy, \
                       level, experience, passive_income_rate, is_admin, unlocked_characters, \
                       selected_character_id, last_tick_at, created_at, updated_at";

/// Provides lookups, first-login creation and progress writes for players.
pub struct PlayerRepo;

impl PlayerRepo {
    /// Find a player by internal id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Player>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM players WHERE id = $1");
        sqlx::query_as::<_, Player>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a player and lock the row until the surrounding transaction ends.
    pub async fn find_for_update<'e, E>(executor: E, id: DbId) -> Result<Option<Player>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM players WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Player>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a player by Telegram user id.
    pub async fn find_by_telegram_id(
        pool: &PgPool,
        telegram_id: &str,
    ) -> Result<Option<Player>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM players WHERE telegram_id = $1");
        sqlx::query_as::<_, Player>(&query)
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a player, or return the existing one for the same Telegram id
    /// (refreshing its username) or dev handle.
    ///
    /// Exactly one of `telegram_id` / `dev_handle` is expected to be set.
    pub async fn create_or_get(pool: &PgPool, input: &CreatePlayer) -> Result<Player, sqlx::Error> {
        let conflict = if input.telegram_id.is_some() {
            "ON CONFLICT ON CONSTRAINT uq_players_telegram_id
             DO UPDATE SET username = EXCLUDED.username"
        } else {
            "ON CONFLICT ON CONSTRAINT uq_players_dev_handle
             DO UPDATE SET dev_handle = EXCLUDED.dev_handle"
        };
        let query = format!(
            "INSERT INTO players (telegram_id, dev_handle, username, is_admin)
             VALUES ($1, $2, $3, $4)
             {conflict}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Player>(&query)
            .bind(&input.telegram_id)
            .bind(&input.dev_handle)
            .bind(&input.username)
            .bind(input.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Update profile fields. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePlayerProfile,
    ) -> Result<Option<Player>, sqlx::Error> {
        let query = format!(
            "UPDATE players SET
                username = COALESCE($2, username),
                selected_character_id = COALESCE($3, selected_character_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Player>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.selected_character_id)
            .fetch_optional(pool)
            .await
    }

    /// Write back the gameplay fields after a game operation.
    pub async fn save_progress<'e, E>(
        executor: E,
        id: DbId,
        progress: &PlayerProgress,
    ) -> Result<Player, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE players SET
                points = $2,
                energy = $3,
                max_energy = $4,
                level = $5,
                experience = $6,
                passive_income_rate = $7,
                unlocked_characters = $8,
                last_tick_at = $9
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Player>(&query)
            .bind(id)
            .bind(progress.points)
            .bind(progress.energy)
            .bind(progress.max_energy)
            .bind(progress.level)
            .bind(progress.experience)
            .bind(progress.passive_income_rate)
            .bind(&progress.unlocked_characters)
            .bind(progress.last_tick_at)
            .fetch_one(executor)
            .await
    }

    /// Grant or revoke the admin flag.
    pub async fn set_admin(pool: &PgPool, id: DbId, is_admin: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE players SET is_admin = $2 WHERE id = $1")
            .bind(id)
            .bind(is_admin)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
