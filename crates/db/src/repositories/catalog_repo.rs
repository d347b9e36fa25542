//! Repositories for the master-data tables.
//!
//! `upsert` is the relational half of the game-data dual write: insert, and
//! on primary-key conflict update every column, so repeating a save is
//! idempotent.

use classiklust_core::catalog::{Character, Level, Upgrade};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::catalog::{CharacterRow, LevelRow, UpgradeRow};

const UPGRADE_COLUMNS: &str = "id, name, description, upgrade_type, icon, max_level, base_cost, \
                               cost_multiplier, base_value, value_increment, is_hidden, \
                               created_at, updated_at";

const CHARACTER_COLUMNS: &str = "id, name, unlock_level, description, rarity, default_image, \
                                 avatar_image, display_image, is_hidden, created_at, updated_at";

const LEVEL_COLUMNS: &str = "level, cost, requirements, unlocks, created_at, updated_at";

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

pub struct UpgradeRepo;

impl UpgradeRepo {
    pub async fn upsert(pool: &PgPool, upgrade: &Upgrade) -> Result<UpgradeRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO upgrades (id, name, description, upgrade_type, icon, max_level,
                                   base_cost, cost_multiplier, base_value, value_increment, is_hidden)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                upgrade_type = EXCLUDED.upgrade_type,
                icon = EXCLUDED.icon,
                max_level = EXCLUDED.max_level,
                base_cost = EXCLUDED.base_cost,
                cost_multiplier = EXCLUDED.cost_multiplier,
                base_value = EXCLUDED.base_value,
                value_increment = EXCLUDED.value_increment,
                is_hidden = EXCLUDED.is_hidden
             RETURNING {UPGRADE_COLUMNS}"
        );
        sqlx::query_as::<_, UpgradeRow>(&query)
            .bind(&upgrade.id)
            .bind(&upgrade.name)
            .bind(&upgrade.description)
            .bind(upgrade.upgrade_type.as_str())
            .bind(&upgrade.icon)
            .bind(upgrade.max_level)
            .bind(upgrade.base_cost)
            .bind(upgrade.cost_multiplier)
            .bind(upgrade.base_value)
            .bind(upgrade.value_increment)
            .bind(upgrade.is_hidden)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<UpgradeRow>, sqlx::Error> {
        let query = format!("SELECT {UPGRADE_COLUMNS} FROM upgrades WHERE id = $1");
        sqlx::query_as::<_, UpgradeRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<UpgradeRow>, sqlx::Error> {
        let query = format!("SELECT {UPGRADE_COLUMNS} FROM upgrades ORDER BY id");
        sqlx::query_as::<_, UpgradeRow>(&query).fetch_all(pool).await
    }

    /// Hard-delete an upgrade. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM upgrades WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

pub struct CharacterRepo;

impl CharacterRepo {
    pub async fn upsert(pool: &PgPool, character: &Character) -> Result<CharacterRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO characters (id, name, unlock_level, description, rarity,
                                     default_image, avatar_image, display_image, is_hidden)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                unlock_level = EXCLUDED.unlock_level,
                description = EXCLUDED.description,
                rarity = EXCLUDED.rarity,
                default_image = EXCLUDED.default_image,
                avatar_image = EXCLUDED.avatar_image,
                display_image = EXCLUDED.display_image,
                is_hidden = EXCLUDED.is_hidden
             RETURNING {CHARACTER_COLUMNS}"
        );
        sqlx::query_as::<_, CharacterRow>(&query)
            .bind(&character.id)
            .bind(&character.name)
            .bind(character.unlock_level)
            .bind(&character.description)
            .bind(character.rarity.as_str())
            .bind(&character.default_image)
            .bind(&character.avatar_image)
            .bind(&character.display_image)
            .bind(character.is_hidden)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<CharacterRow>, sqlx::Error> {
        let query = format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1");
        sqlx::query_as::<_, CharacterRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<CharacterRow>, sqlx::Error> {
        let query = format!("SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY id");
        sqlx::query_as::<_, CharacterRow>(&query).fetch_all(pool).await
    }

    /// Hard-delete a character. Media rows cascade.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

pub struct LevelRepo;

impl LevelRepo {
    pub async fn upsert(pool: &PgPool, level: &Level) -> Result<LevelRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO levels (level, cost, requirements, unlocks)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (level) DO UPDATE SET
                cost = EXCLUDED.cost,
                requirements = EXCLUDED.requirements,
                unlocks = EXCLUDED.unlocks
             RETURNING {LEVEL_COLUMNS}"
        );
        sqlx::query_as::<_, LevelRow>(&query)
            .bind(level.level)
            .bind(level.cost)
            .bind(Json(&level.requirements))
            .bind(&level.unlocks)
            .fetch_one(pool)
            .await
    }

    pub async fn find(pool: &PgPool, level: i32) -> Result<Option<LevelRow>, sqlx::Error> {
        let query = format!("SELECT {LEVEL_COLUMNS} FROM levels WHERE level = $1");
        sqlx::query_as::<_, LevelRow>(&query)
            .bind(level)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<LevelRow>, sqlx::Error> {
        let query = format!("SELECT {LEVEL_COLUMNS} FROM levels ORDER BY level");
        sqlx::query_as::<_, LevelRow>(&query).fetch_all(pool).await
    }

    pub async fn delete(pool: &PgPool, level: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM levels WHERE level = $1")
            .bind(level)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
