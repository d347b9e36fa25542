//! The relational half of the dual write.

use async_trait::async_trait;
use classiklust_core::catalog::{Character, Level, Upgrade};
use classiklust_db::repositories::{CharacterRepo, LevelRepo, UpgradeRepo};
use sqlx::PgPool;

use crate::entity::GameEntity;

/// Durable storage for one catalog kind.
#[async_trait]
pub trait RecordStore<T: GameEntity>: Send + Sync {
    async fn upsert(&self, record: &T) -> Result<(), sqlx::Error>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, key: &T::Key) -> Result<bool, sqlx::Error>;

    async fn load_all(&self) -> Result<Vec<T>, sqlx::Error>;
}

/// A store covering every catalog kind.
pub trait CatalogStore: RecordStore<Upgrade> + RecordStore<Character> + RecordStore<Level> {}

impl<S> CatalogStore for S where S: RecordStore<Upgrade> + RecordStore<Character> + RecordStore<Level> {}

/// Postgres-backed catalog store.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore<Upgrade> for PgCatalogStore {
    async fn upsert(&self, record: &Upgrade) -> Result<(), sqlx::Error> {
        UpgradeRepo::upsert(&self.pool, record).await.map(|_| ())
    }

    async fn delete(&self, key: &String) -> Result<bool, sqlx::Error> {
        UpgradeRepo::delete(&self.pool, key).await
    }

    async fn load_all(&self) -> Result<Vec<Upgrade>, sqlx::Error> {
        UpgradeRepo::list(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_upgrade())
            .collect()
    }
}

#[async_trait]
impl RecordStore<Character> for PgCatalogStore {
    async fn upsert(&self, record: &Character) -> Result<(), sqlx::Error> {
        CharacterRepo::upsert(&self.pool, record).await.map(|_| ())
    }

    async fn delete(&self, key: &String) -> Result<bool, sqlx::Error> {
        CharacterRepo::delete(&self.pool, key).await
    }

    async fn load_all(&self) -> Result<Vec<Character>, sqlx::Error> {
        CharacterRepo::list(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_character())
            .collect()
    }
}

#[async_trait]
impl RecordStore<Level> for PgCatalogStore {
    async fn upsert(&self, record: &Level) -> Result<(), sqlx::Error> {
        LevelRepo::upsert(&self.pool, record).await.map(|_| ())
    }

    async fn delete(&self, key: &i32) -> Result<bool, sqlx::Error> {
        LevelRepo::delete(&self.pool, *key).await
    }

    async fn load_all(&self) -> Result<Vec<Level>, sqlx::Error> {
        Ok(LevelRepo::list(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_level())
            .collect())
    }
}
