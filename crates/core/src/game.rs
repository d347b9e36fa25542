//! Gameplay rules: taps, upgrade purchases, level-ups, passive income.
//!
//! Pure logic over a [`GameState`] snapshot. The API layer loads the player
//! row inside a transaction, applies one of these operations and writes the
//! snapshot back, so every rule is enforced server-side.

use std::collections::HashMap;

use crate::catalog::{Character, Level, Upgrade, UpgradeType};
use crate::error::CoreError;
use crate::types::Timestamp;

/// Energy pool before any `energyMax` upgrades.
pub const BASE_MAX_ENERGY: i32 = 1000;

/// Energy regenerated per elapsed second.
pub const ENERGY_REGEN_PER_SEC: i64 = 1;

/// Passive income stops accruing after this much offline time.
pub const MAX_PASSIVE_ACCRUAL_SECS: i64 = 3 * 60 * 60;

/// Upper bound on taps batched into a single request.
pub const MAX_TAPS_PER_REQUEST: i32 = 200;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid level increment")]
    InvalidLevelIncrement,

    #[error("Upgrade is already at max level")]
    MaxLevelReached,

    #[error("Insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Tap count must be between 1 and {MAX_TAPS_PER_REQUEST}")]
    InvalidTapCount,

    #[error("Not enough energy: need {required}, have {available}")]
    NotEnoughEnergy { required: i32, available: i32 },

    #[error("Already at the highest level")]
    NoNextLevel,

    #[error("Requirement not met: {upgrade_id} must be level {min_level} (currently {current})")]
    RequirementNotMet {
        upgrade_id: String,
        min_level: i32,
        current: i32,
    },
}

impl From<GameError> for CoreError {
    fn from(err: GameError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable gameplay fields of a player.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub points: i64,
    pub energy: i32,
    pub max_energy: i32,
    pub level: i32,
    pub experience: i64,
    pub passive_income_rate: i64,
    /// upgrade id -> owned level
    pub upgrades: HashMap<String, i32>,
    pub unlocked_characters: Vec<String>,
    pub last_tick_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub points_earned: i64,
    pub energy_restored: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOutcome {
    pub points_earned: i64,
    pub per_tap: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub upgrade_id: String,
    pub new_level: i32,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpOutcome {
    pub new_level: i32,
    pub cost: i64,
    pub newly_unlocked: Vec<String>,
}

impl GameState {
    /// Owned level of an upgrade (0 when never purchased).
    pub fn upgrade_level(&self, upgrade_id: &str) -> i32 {
        self.upgrades.get(upgrade_id).copied().unwrap_or(0)
    }

    fn sum_values(&self, catalog: &[Upgrade], kind: UpgradeType) -> f64 {
        catalog
            .iter()
            .filter(|u| u.upgrade_type == kind)
            .map(|u| u.value_at(self.upgrade_level(&u.id)))
            .sum()
    }

    /// Points earned per tap: 1 plus every owned `perTap` upgrade.
    pub fn per_tap(&self, catalog: &[Upgrade]) -> i64 {
        (1.0 + self.sum_values(catalog, UpgradeType::PerTap)).floor() as i64
    }

    /// Recompute stats derived from owned upgrades.
    pub fn recompute_stats(&mut self, catalog: &[Upgrade]) {
        self.passive_income_rate = self.sum_values(catalog, UpgradeType::PerHour).floor() as i64;
        let bonus = self.sum_values(catalog, UpgradeType::EnergyMax).floor() as i32;
        self.max_energy = BASE_MAX_ENERGY + bonus.max(0);
        self.energy = self.energy.min(self.max_energy);
    }

    /// Accrue passive income and regenerate energy up to `now`.
    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let elapsed = (now - self.last_tick_at).num_seconds();
        if elapsed <= 0 {
            return TickOutcome::default();
        }

        let accrual_secs = elapsed.min(MAX_PASSIVE_ACCRUAL_SECS);
        let points_earned = self.passive_income_rate * accrual_secs / 3600;
        self.points += points_earned;

        let missing = i64::from((self.max_energy - self.energy).max(0));
        let energy_restored = (elapsed * ENERGY_REGEN_PER_SEC).min(missing) as i32;
        self.energy += energy_restored;

        self.last_tick_at = now;
        TickOutcome {
            points_earned,
            energy_restored,
        }
    }

    /// Spend `count` energy for `count * per_tap` points and experience.
    pub fn tap(&mut self, count: i32, catalog: &[Upgrade]) -> Result<TapOutcome, GameError> {
        if !(1..=MAX_TAPS_PER_REQUEST).contains(&count) {
            return Err(GameError::InvalidTapCount);
        }
        if count > self.energy {
            return Err(GameError::NotEnoughEnergy {
                required: count,
                available: self.energy,
            });
        }

        let per_tap = self.per_tap(catalog);
        let points_earned = per_tap * i64::from(count);
        self.energy -= count;
        self.points += points_earned;
        self.experience += i64::from(count);

        Ok(TapOutcome {
            points_earned,
            per_tap,
        })
    }

    /// Buy the next level of `upgrade`. `requested_level` must be exactly one
    /// above the owned level.
    pub fn purchase_upgrade(
        &mut self,
        upgrade: &Upgrade,
        requested_level: i32,
        catalog: &[Upgrade],
    ) -> Result<PurchaseOutcome, GameError> {
        let current = self.upgrade_level(&upgrade.id);
        if current >= upgrade.max_level {
            return Err(GameError::MaxLevelReached);
        }
        if requested_level != current + 1 {
            return Err(GameError::InvalidLevelIncrement);
        }

        let cost = upgrade.cost_at(current);
        if self.points < cost {
            return Err(GameError::InsufficientPoints {
                required: cost,
                available: self.points,
            });
        }

        self.points -= cost;
        self.upgrades.insert(upgrade.id.clone(), requested_level);
        self.recompute_stats(catalog);

        Ok(PurchaseOutcome {
            upgrade_id: upgrade.id.clone(),
            new_level: requested_level,
            cost,
        })
    }

    /// Advance to `next`, which must be the level directly above the
    /// current one. Unlocks the level's listed ids plus every character whose
    /// `unlock_level` is now reached.
    pub fn level_up(
        &mut self,
        next: Option<&Level>,
        characters: &[Character],
    ) -> Result<LevelUpOutcome, GameError> {
        let next = next
            .filter(|l| l.level == self.level + 1)
            .ok_or(GameError::NoNextLevel)?;

        for req in &next.requirements {
            let current = self.upgrade_level(&req.upgrade_id);
            if current < req.min_level {
                return Err(GameError::RequirementNotMet {
                    upgrade_id: req.upgrade_id.clone(),
                    min_level: req.min_level,
                    current,
                });
            }
        }

        if self.points < next.cost {
            return Err(GameError::InsufficientPoints {
                required: next.cost,
                available: self.points,
            });
        }

        self.points -= next.cost;
        self.level = next.level;

        let character_ids = characters
            .iter()
            .filter(|c| c.unlock_level <= next.level)
            .map(|c| c.id.as_str());
        let listed = next
            .unlocks
            .iter()
            .map(String::as_str)
            .filter(|id| characters.iter().any(|c| c.id == *id));

        let mut newly_unlocked = Vec::new();
        for id in listed.chain(character_ids) {
            if !self.unlocked_characters.iter().any(|u| u == id) {
                self.unlocked_characters.push(id.to_string());
                newly_unlocked.push(id.to_string());
            }
        }

        Ok(LevelUpOutcome {
            new_level: next.level,
            cost: next.cost,
            newly_unlocked,
        })
    }
}
