//! Player entity model and DTOs.

use std::collections::HashMap;

use classiklust_core::game::GameState;
use classiklust_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A player row from the `players` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: DbId,
    pub telegram_id: Option<String>,
    pub dev_handle: Option<String>,
    pub username: String,
    pub points: i64,
    pub energy: i32,
    pub max_energy: i32,
    pub level: i32,
    pub experience: i64,
    pub passive_income_rate: i64,
    pub is_admin: bool,
    pub unlocked_characters: Vec<String>,
    pub selected_character_id: Option<String>,
    pub last_tick_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Player {
    /// Snapshot the gameplay fields together with the owned upgrade levels.
    pub fn game_state(&self, upgrades: HashMap<String, i32>) -> GameState {
        GameState {
            points: self.points,
            energy: self.energy,
            max_energy: self.max_energy,
            level: self.level,
            experience: self.experience,
            passive_income_rate: self.passive_income_rate,
            upgrades,
            unlocked_characters: self.unlocked_characters.clone(),
            last_tick_at: self.last_tick_at,
        }
    }
}

/// A row from the `player_upgrades` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpgrade {
    pub player_id: DbId,
    pub upgrade_id: String,
    pub level: i32,
    pub updated_at: Timestamp,
}

/// DTO for creating a player on first login.
#[derive(Debug, Clone)]
pub struct CreatePlayer {
    pub telegram_id: Option<String>,
    pub dev_handle: Option<String>,
    pub username: String,
    pub is_admin: bool,
}

/// Profile fields a player may change directly. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerProfile {
    pub username: Option<String>,
    pub selected_character_id: Option<String>,
}

/// Gameplay fields written back after a game operation.
#[derive(Debug, Clone)]
pub struct PlayerProgress {
    pub points: i64,
    pub energy: i32,
    pub max_energy: i32,
    pub level: i32,
    pub experience: i64,
    pub passive_income_rate: i64,
    pub unlocked_characters: Vec<String>,
    pub last_tick_at: Timestamp,
}

impl From<&GameState> for PlayerProgress {
    fn from(state: &GameState) -> Self {
        Self {
            points: state.points,
            energy: state.energy,
            max_energy: state.max_energy,
            level: state.level,
            experience: state.experience,
            passive_income_rate: state.passive_income_rate,
            unlocked_characters: state.unlocked_characters.clone(),
            last_tick_at: state.last_tick_at,
        }
    }
}
