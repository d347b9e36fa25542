//! In-memory catalog cache.
//!
//! Each kind is an ordered map behind a `tokio::sync::RwLock`. Readers clone
//! out of the lock; writers hold it only for the map operation itself.

use std::collections::BTreeMap;

use classiklust_core::catalog::{Character, Level, Upgrade};
use tokio::sync::RwLock;

use crate::entity::GameEntity;

pub struct EntityCache<T: GameEntity> {
    records: RwLock<BTreeMap<T::Key, T>>,
}

impl<T: GameEntity> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: GameEntity> EntityCache<T> {
    /// All records ordered by key.
    pub async fn list(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn get(&self, key: &T::Key) -> Option<T> {
        self.records.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &T::Key) -> bool {
        self.records.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Insert or replace; returns the previous record.
    pub async fn insert(&self, record: T) -> Option<T> {
        self.records.write().await.insert(record.key(), record)
    }

    pub async fn remove(&self, key: &T::Key) -> Option<T> {
        self.records.write().await.remove(key)
    }

    /// Swap the whole partition. Later duplicates win.
    pub async fn replace_all(&self, records: Vec<T>) {
        let map: BTreeMap<T::Key, T> = records.into_iter().map(|r| (r.key(), r)).collect();
        *self.records.write().await = map;
    }
}

/// The full catalog cache, one partition per kind.
#[derive(Default)]
pub struct GameDataCache {
    pub upgrades: EntityCache<Upgrade>,
    pub characters: EntityCache<Character>,
    pub levels: EntityCache<Level>,
}
