use std::fmt::{Debug, Display};

use classiklust_core::catalog::{Character, EntityKind, Level, Upgrade};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::cache::{EntityCache, GameDataCache};

/// A catalog record kind managed by the sync layer.
pub trait GameEntity:
    Clone + Debug + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    /// Primary key. Ordered so cache listings are deterministic.
    type Key: Ord + Clone + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static;

    const KIND: EntityKind;

    fn key(&self) -> Self::Key;

    /// The cache partition holding this kind.
    fn cache(cache: &GameDataCache) -> &EntityCache<Self>;
}

impl GameEntity for Upgrade {
    type Key = String;
    const KIND: EntityKind = EntityKind::Upgrades;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn cache(cache: &GameDataCache) -> &EntityCache<Self> {
        &cache.upgrades
    }
}

impl GameEntity for Character {
    type Key = String;
    const KIND: EntityKind = EntityKind::Characters;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn cache(cache: &GameDataCache) -> &EntityCache<Self> {
        &cache.characters
    }
}

impl GameEntity for Level {
    type Key = i32;
    const KIND: EntityKind = EntityKind::Levels;

    fn key(&self) -> i32 {
        self.level
    }

    fn cache(cache: &GameDataCache) -> &EntityCache<Self> {
        &cache.levels
    }
}
