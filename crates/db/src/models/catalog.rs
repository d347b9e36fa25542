//! Row structs for the `upgrades`, `characters` and `levels` tables.
//!
//! Rows convert into the core catalog types; enum columns are stored as
//! text and parsed on the way out.

use classiklust_core::catalog::{Character, Level, LevelRequirement, Upgrade};
use classiklust_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::FromRow;

fn decode_error(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

/// An upgrade row from the `upgrades` table.
#[derive(Debug, Clone, FromRow)]
pub struct UpgradeRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub upgrade_type: String,
    pub icon: String,
    pub max_level: i32,
    pub base_cost: i64,
    pub cost_multiplier: f64,
    pub base_value: f64,
    pub value_increment: f64,
    pub is_hidden: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UpgradeRow {
    pub fn into_upgrade(self) -> Result<Upgrade, sqlx::Error> {
        Ok(Upgrade {
            upgrade_type: self.upgrade_type.parse().map_err(decode_error)?,
            id: self.id,
            name: self.name,
            description: self.description,
            icon: self.icon,
            max_level: self.max_level,
            base_cost: self.base_cost,
            cost_multiplier: self.cost_multiplier,
            base_value: self.base_value,
            value_increment: self.value_increment,
            is_hidden: self.is_hidden,
        })
    }
}

/// A character row from the `characters` table.
#[derive(Debug, Clone, FromRow)]
pub struct CharacterRow {
    pub id: String,
    pub name: String,
    pub unlock_level: i32,
    pub description: String,
    pub rarity: String,
    pub default_image: Option<String>,
    pub avatar_image: Option<String>,
    pub display_image: Option<String>,
    pub is_hidden: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CharacterRow {
    pub fn into_character(self) -> Result<Character, sqlx::Error> {
        Ok(Character {
            rarity: self.rarity.parse().map_err(decode_error)?,
            id: self.id,
            name: self.name,
            unlock_level: self.unlock_level,
            description: self.description,
            default_image: self.default_image,
            avatar_image: self.avatar_image,
            display_image: self.display_image,
            is_hidden: self.is_hidden,
        })
    }
}

/// A level row from the `levels` table.
#[derive(Debug, Clone, FromRow)]
pub struct LevelRow {
    pub level: i32,
    pub cost: i64,
    pub requirements: Json<Vec<LevelRequirement>>,
    pub unlocks: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LevelRow {
    pub fn into_level(self) -> Level {
        Level {
            level: self.level,
            cost: self.cost,
            requirements: self.requirements.0,
            unlocks: self.unlocks,
        }
    }
}
