//! Game-balance master records: upgrades, characters and levels.
//!
//! These are the shapes stored in the JSON master files and mirrored into
//! Postgres. Field names serialize as camelCase to match the files the admin
//! console edits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The three master-data collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Upgrades,
    Characters,
    Levels,
}

impl EntityKind {
    /// Sync order: levels reference upgrades and characters.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Upgrades,
        EntityKind::Characters,
        EntityKind::Levels,
    ];

    /// Collection name, also the top-level array key in master files.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Upgrades => "upgrades",
            EntityKind::Characters => "characters",
            EntityKind::Levels => "levels",
        }
    }

    /// Singular entity name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            EntityKind::Upgrades => "Upgrade",
            EntityKind::Characters => "Character",
            EntityKind::Levels => "Level",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upgrades" => Ok(EntityKind::Upgrades),
            "characters" => Ok(EntityKind::Characters),
            "levels" => Ok(EntityKind::Levels),
            other => Err(format!("Unknown entity kind '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// What an upgrade's value feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeType {
    PerTap,
    PerHour,
    EnergyMax,
    Other,
}

impl UpgradeType {
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeType::PerTap => "perTap",
            UpgradeType::PerHour => "perHour",
            UpgradeType::EnergyMax => "energyMax",
            UpgradeType::Other => "other",
        }
    }
}

impl FromStr for UpgradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perTap" => Ok(UpgradeType::PerTap),
            "perHour" => Ok(UpgradeType::PerHour),
            "energyMax" => Ok(UpgradeType::EnergyMax),
            "other" => Ok(UpgradeType::Other),
            other => Err(format!("Unknown upgrade type '{other}'")),
        }
    }
}

/// A purchasable upgrade definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub upgrade_type: UpgradeType,
    #[serde(default)]
    pub icon: String,
    #[validate(range(min = 1))]
    pub max_level: i32,
    #[validate(range(min = 0))]
    pub base_cost: i64,
    #[validate(range(min = 1.0))]
    pub cost_multiplier: f64,
    #[serde(default)]
    pub base_value: f64,
    #[serde(default)]
    pub value_increment: f64,
    #[serde(default)]
    pub is_hidden: bool,
}

impl Upgrade {
    /// Cost to go from `current_level` to `current_level + 1`:
    /// `floor(baseCost * costMultiplier^currentLevel)`.
    pub fn cost_at(&self, current_level: i32) -> i64 {
        let raw = self.base_cost as f64 * self.cost_multiplier.powi(current_level);
        raw.floor() as i64
    }

    /// Effect value contributed at `level`. Level 0 contributes nothing.
    pub fn value_at(&self, level: i32) -> f64 {
        if level <= 0 {
            return 0.0;
        }
        self.base_value + self.value_increment * f64::from(level - 1)
    }
}

/// Partial update for an upgrade. `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUpgrade {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub upgrade_type: Option<UpgradeType>,
    pub icon: Option<String>,
    pub max_level: Option<i32>,
    pub base_cost: Option<i64>,
    pub cost_multiplier: Option<f64>,
    pub base_value: Option<f64>,
    pub value_increment: Option<f64>,
    pub is_hidden: Option<bool>,
}

impl UpdateUpgrade {
    pub fn apply(self, target: &mut Upgrade) {
        if let Some(v) = self.name {
            target.name = v;
        }
        if let Some(v) = self.description {
            target.description = v;
        }
        if let Some(v) = self.upgrade_type {
            target.upgrade_type = v;
        }
        if let Some(v) = self.icon {
            target.icon = v;
        }
        if let Some(v) = self.max_level {
            target.max_level = v;
        }
        if let Some(v) = self.base_cost {
            target.base_cost = v;
        }
        if let Some(v) = self.cost_multiplier {
            target.cost_multiplier = v;
        }
        if let Some(v) = self.base_value {
            target.base_value = v;
        }
        if let Some(v) = self.value_increment {
            target.value_increment = v;
        }
        if let Some(v) = self.is_hidden {
            target.is_hidden = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Common" => Ok(Rarity::Common),
            "Rare" => Ok(Rarity::Rare),
            "Epic" => Ok(Rarity::Epic),
            "Legendary" => Ok(Rarity::Legendary),
            other => Err(format!("Unknown rarity '{other}'")),
        }
    }
}

/// An unlockable character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 1))]
    pub unlock_level: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub default_image: Option<String>,
    #[serde(default)]
    pub avatar_image: Option<String>,
    #[serde(default)]
    pub display_image: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub unlock_level: Option<i32>,
    pub description: Option<String>,
    pub rarity: Option<Rarity>,
    pub default_image: Option<String>,
    pub avatar_image: Option<String>,
    pub display_image: Option<String>,
    pub is_hidden: Option<bool>,
}

impl UpdateCharacter {
    pub fn apply(self, target: &mut Character) {
        if let Some(v) = self.name {
            target.name = v;
        }
        if let Some(v) = self.unlock_level {
            target.unlock_level = v;
        }
        if let Some(v) = self.description {
            target.description = v;
        }
        if let Some(v) = self.rarity {
            target.rarity = v;
        }
        if self.default_image.is_some() {
            target.default_image = self.default_image;
        }
        if self.avatar_image.is_some() {
            target.avatar_image = self.avatar_image;
        }
        if self.display_image.is_some() {
            target.display_image = self.display_image;
        }
        if let Some(v) = self.is_hidden {
            target.is_hidden = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// A player must own `upgrade_id` at `min_level` or above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequirement {
    #[validate(length(min = 1))]
    pub upgrade_id: String,
    #[validate(range(min = 1))]
    pub min_level: i32,
}

/// Definition of a player level. `level` is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    #[validate(range(min = 1))]
    pub level: i32,
    #[validate(range(min = 0))]
    pub cost: i64,
    #[serde(default)]
    #[validate(nested)]
    pub requirements: Vec<LevelRequirement>,
    #[serde(default)]
    pub unlocks: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLevel {
    pub cost: Option<i64>,
    pub requirements: Option<Vec<LevelRequirement>>,
    pub unlocks: Option<Vec<String>>,
}

impl UpdateLevel {
    pub fn apply(self, target: &mut Level) {
        if let Some(v) = self.cost {
            target.cost = v;
        }
        if let Some(v) = self.requirements {
            target.requirements = v;
        }
        if let Some(v) = self.unlocks {
            target.unlocks = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_upgrade() -> Upgrade {
        Upgrade {
            id: "tap-power".into(),
            name: "Tap Power".into(),
            description: String::new(),
            upgrade_type: UpgradeType::PerTap,
            icon: "👆".into(),
            max_level: 10,
            base_cost: 10,
            cost_multiplier: 1.15,
            base_value: 1.0,
            value_increment: 0.5,
            is_hidden: false,
        }
    }

    #[test]
    fn cost_follows_floor_of_geometric_growth() {
        let upgrade = sample_upgrade();
        for level in 0..10 {
            let expected = (10.0 * 1.15_f64.powi(level)).floor() as i64;
            assert_eq!(upgrade.cost_at(level), expected, "level {level}");
        }
        assert_eq!(upgrade.cost_at(0), 10);
        assert_eq!(upgrade.cost_at(1), 11);
    }

    #[test]
    fn value_is_zero_before_first_level() {
        let upgrade = sample_upgrade();
        assert_eq!(upgrade.value_at(0), 0.0);
        assert_eq!(upgrade.value_at(1), 1.0);
        assert_eq!(upgrade.value_at(3), 2.0);
    }

    #[test]
    fn upgrade_json_uses_camel_case_and_type_key() {
        let json = serde_json::to_value(sample_upgrade()).unwrap();
        assert_eq!(json["type"], "perTap");
        assert_eq!(json["maxLevel"], 10);
        assert_eq!(json["costMultiplier"], 1.15);
        assert_eq!(json["isHidden"], false);
    }

    #[test]
    fn validation_rejects_out_of_range_fields() {
        let mut upgrade = sample_upgrade();
        upgrade.max_level = 0;
        upgrade.cost_multiplier = 0.5;
        let err = upgrade.validate().unwrap_err();
        let message = crate::error::describe_validation_errors(&err);
        assert!(message.contains("maxLevel") || message.contains("max_level"));
        assert!(message.contains("cost_multiplier") || message.contains("costMultiplier"));
    }

    #[test]
    fn character_defaults_fill_missing_fields() {
        let character: Character =
            serde_json::from_value(serde_json::json!({"id": "luna", "name": "Luna", "unlockLevel": 1}))
                .unwrap();
        assert_eq!(character.rarity, Rarity::Common);
        assert!(!character.is_hidden);
        assert!(character.default_image.is_none());
    }

    #[test]
    fn level_validation_checks_nested_requirements() {
        let level = Level {
            level: 2,
            cost: 100,
            requirements: vec![LevelRequirement {
                upgrade_id: "tap-power".into(),
                min_level: 0,
            }],
            unlocks: vec![],
        };
        assert!(level.validate().is_err());
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut upgrade = sample_upgrade();
        UpdateUpgrade {
            base_cost: Some(50),
            ..Default::default()
        }
        .apply(&mut upgrade);
        assert_eq!(upgrade.base_cost, 50);
        assert_eq!(upgrade.name, "Tap Power");
    }

    #[test]
    fn entity_kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("tasks".parse::<EntityKind>().is_err());
    }
}
