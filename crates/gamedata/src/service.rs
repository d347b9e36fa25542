//! The dual-write persister.
//!
//! Every catalog mutation goes: validate, journal intent, database, cache,
//! JSON mirror, clear intent. Writes to one kind are serialized by a per-kind
//! mutex held for the whole sequence.

use classiklust_core::catalog::EntityKind;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use validator::Validate;

use crate::cache::GameDataCache;
use crate::entity::GameEntity;
use crate::error::GameDataError;
use crate::journal::{Intent, IntentJournal, IntentOp};
use crate::layout::DataLayout;
use crate::mirror::{self, MirrorStatus};
use crate::source::MasterFileLoader;
use crate::store::RecordStore;

/// Result of a successful save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome<T> {
    pub record: T,
    /// `false` when an existing record was replaced.
    pub created: bool,
    pub mirror: MirrorStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub key: String,
    pub mirror: MirrorStatus,
}

#[derive(Default)]
struct WriteLocks {
    upgrades: Mutex<()>,
    characters: Mutex<()>,
    levels: Mutex<()>,
}

impl WriteLocks {
    async fn lock(&self, kind: EntityKind) -> MutexGuard<'_, ()> {
        match kind {
            EntityKind::Upgrades => self.upgrades.lock().await,
            EntityKind::Characters => self.characters.lock().await,
            EntityKind::Levels => self.levels.lock().await,
        }
    }
}

/// Catalog cache plus the machinery to keep it, the database and the JSON
/// mirror in step.
pub struct GameData<S> {
    layout: DataLayout,
    cache: GameDataCache,
    store: S,
    loader: MasterFileLoader,
    journal: IntentJournal,
    locks: WriteLocks,
}

impl<S: Send + Sync> GameData<S> {
    pub fn new(layout: DataLayout, store: S) -> Self {
        let loader = MasterFileLoader::with_defaults(&layout);
        Self::with_loader(layout, store, loader)
    }

    pub fn with_loader(layout: DataLayout, store: S, loader: MasterFileLoader) -> Self {
        let journal = IntentJournal::new(&layout);
        Self {
            layout,
            cache: GameDataCache::default(),
            store,
            loader,
            journal,
            locks: WriteLocks::default(),
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn cache(&self) -> &GameDataCache {
        &self.cache
    }

    pub(crate) fn store_ref(&self) -> &S {
        &self.store
    }

    pub(crate) fn loader(&self) -> &MasterFileLoader {
        &self.loader
    }

    pub(crate) fn journal(&self) -> &IntentJournal {
        &self.journal
    }

    pub(crate) async fn lock(&self, kind: EntityKind) -> MutexGuard<'_, ()> {
        self.locks.lock(kind).await
    }

    pub async fn list<T: GameEntity>(&self) -> Vec<T> {
        T::cache(&self.cache).list().await
    }

    pub async fn get<T: GameEntity>(&self, key: &T::Key) -> Option<T> {
        T::cache(&self.cache).get(key).await
    }

    /// Create or replace a record.
    pub async fn save<T>(&self, record: T) -> Result<SaveOutcome<T>, GameDataError>
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        record.validate()?;
        let _guard = self.lock(T::KIND).await;
        self.save_locked(record).await
    }

    /// Read-modify-write of an existing record under the kind's write lock.
    pub async fn update<T, F>(&self, key: &T::Key, apply: F) -> Result<SaveOutcome<T>, GameDataError>
    where
        T: GameEntity,
        S: RecordStore<T>,
        F: FnOnce(&mut T) + Send,
    {
        let _guard = self.lock(T::KIND).await;
        let mut record = T::cache(&self.cache)
            .get(key)
            .await
            .ok_or_else(|| not_found::<T>(key))?;
        apply(&mut record);
        record.validate()?;
        self.save_locked(record).await
    }

    pub async fn delete<T>(&self, key: &T::Key) -> Result<DeleteOutcome, GameDataError>
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        let _guard = self.lock(T::KIND).await;
        if !T::cache(&self.cache).contains(key).await {
            return Err(not_found::<T>(key));
        }

        let intent_path = self.journal.record(&Intent::delete::<T>(key)?).await?;
        if let Err(e) = RecordStore::<T>::delete(&self.store, key).await {
            self.journal.clear(&intent_path).await;
            return Err(e.into());
        }
        T::cache(&self.cache).remove(key).await;

        let mirror = self.write_mirror::<T>().await;
        self.settle_journal::<T>(&mirror, &intent_path).await;
        tracing::info!(kind = %T::KIND, %key, "Deleted game data record");
        Ok(DeleteOutcome {
            key: key.to_string(),
            mirror,
        })
    }

    /// Rewrite the mirror of `T::KIND` after replaying any pending intents.
    pub async fn reconcile<T>(&self) -> MirrorStatus
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        let _guard = self.lock(T::KIND).await;
        let (replayed, pending) = self.replay_pending_locked::<T>().await;
        let mirror = self.write_mirror::<T>().await;
        if mirror.is_canonical() {
            for path in &pending {
                self.journal.clear(path).await;
            }
        }
        tracing::info!(kind = %T::KIND, replayed, written = mirror.is_written(), "Reconciled JSON mirror");
        mirror
    }

    async fn save_locked<T>(&self, record: T) -> Result<SaveOutcome<T>, GameDataError>
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        let intent_path = self.journal.record(&Intent::upsert(&record)?).await?;
        if let Err(e) = RecordStore::<T>::upsert(&self.store, &record).await {
            self.journal.clear(&intent_path).await;
            tracing::error!(kind = %T::KIND, key = %record.key(), error = %e, "Database write failed");
            return Err(e.into());
        }
        let created = T::cache(&self.cache).insert(record.clone()).await.is_none();

        let mirror = self.write_mirror::<T>().await;
        self.settle_journal::<T>(&mirror, &intent_path).await;
        tracing::info!(kind = %T::KIND, key = %record.key(), created, "Saved game data record");
        Ok(SaveOutcome {
            record,
            created,
            mirror,
        })
    }

    /// A master file written from the cache holds every earlier write, so all
    /// intents for the kind are stale from here on and must not be replayed
    /// over this one. After a legacy fallback the master may still be stale,
    /// so the whole ordered run of intents is kept for the next replay.
    async fn settle_journal<T: GameEntity>(&self, mirror: &MirrorStatus, intent_path: &std::path::Path) {
        if mirror.is_canonical() {
            let cleared = self.journal.clear_kind(T::KIND).await;
            if cleared > 0 {
                tracing::debug!(kind = %T::KIND, cleared, "Cleared superseded journal intents");
            }
        } else {
            tracing::warn!(kind = %T::KIND, intent = %intent_path.display(), "Master file not updated, keeping journal intent");
        }
    }

    pub(crate) async fn write_mirror<T: GameEntity>(&self) -> MirrorStatus {
        let records = T::cache(&self.cache).list().await;
        mirror::write_collection(&self.layout, &records).await
    }

    /// Re-apply every pending intent for `T::KIND` to the store and cache.
    /// Returns the number applied and the journal paths whose effect is now
    /// in the database; those can be cleared once the mirror is written.
    /// Caller must hold the kind's write lock.
    pub(crate) async fn replay_pending_locked<T>(&self) -> (usize, Vec<std::path::PathBuf>)
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        let mut applied = Vec::new();
        for pending in self.journal.pending(T::KIND).await {
            let result = match pending.intent.op {
                IntentOp::Upsert { record } => match serde_json::from_value::<T>(record) {
                    Ok(record) => match RecordStore::<T>::upsert(&self.store, &record).await {
                        Ok(()) => {
                            T::cache(&self.cache).insert(record).await;
                            Ok(())
                        }
                        Err(e) => Err(e.to_string()),
                    },
                    Err(e) => Err(e.to_string()),
                },
                IntentOp::Delete { key } => match serde_json::from_value::<T::Key>(key) {
                    Ok(key) => match RecordStore::<T>::delete(&self.store, &key).await {
                        Ok(_) => {
                            T::cache(&self.cache).remove(&key).await;
                            Ok(())
                        }
                        Err(e) => Err(e.to_string()),
                    },
                    Err(e) => Err(e.to_string()),
                },
            };
            match result {
                Ok(()) => applied.push(pending.path),
                Err(error) => tracing::warn!(
                    kind = %T::KIND,
                    intent = %pending.intent.id,
                    %error,
                    "Failed to replay journal intent"
                ),
            }
        }
        (applied.len(), applied)
    }
}

fn not_found<T: GameEntity>(key: &T::Key) -> GameDataError {
    GameDataError::NotFound {
        kind: T::KIND,
        key: key.to_string(),
    }
}
