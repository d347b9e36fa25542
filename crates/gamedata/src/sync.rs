//! Startup / resync orchestration.

use classiklust_core::catalog::{Character, EntityKind, Level, Upgrade};
use serde::Serialize;

use crate::entity::GameEntity;
use crate::service::GameData;
use crate::store::{CatalogStore, RecordStore};

/// Outcome of syncing one kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySyncReport {
    pub kind: EntityKind,
    /// Source the records came from, if any file source resolved.
    pub source: Option<String>,
    pub loaded: usize,
    pub stored: usize,
    pub store_failures: usize,
    pub seeded_from_database: bool,
    pub migrated_to_master: bool,
    pub replayed_intents: usize,
    pub cached: usize,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl EntitySyncReport {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            source: None,
            loaded: 0,
            stored: 0,
            store_failures: 0,
            seeded_from_database: false,
            migrated_to_master: false,
            replayed_intents: 0,
            cached: 0,
            warnings: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub entities: Vec<EntitySyncReport>,
}

impl SyncReport {
    /// `true` if any kind failed outright or had records it could not store.
    pub fn has_errors(&self) -> bool {
        self.entities
            .iter()
            .any(|e| e.error.is_some() || e.store_failures > 0)
    }

    pub fn warning_count(&self) -> usize {
        self.entities.iter().map(|e| e.warnings.len()).sum()
    }
}

impl<S: CatalogStore> GameData<S> {
    /// Sync upgrades, characters and levels in that order. One kind failing
    /// does not stop the others.
    pub async fn sync_all(&self) -> SyncReport {
        let entities = vec![
            self.sync_kind::<Upgrade>().await,
            self.sync_kind::<Character>().await,
            self.sync_kind::<Level>().await,
        ];
        let report = SyncReport { entities };
        tracing::info!(
            errors = report.has_errors(),
            warnings = report.warning_count(),
            "Game data sync complete"
        );
        report
    }

    /// Rewrite every kind's mirror from the cache, replaying pending intents.
    pub async fn reconcile_all(&self) -> Vec<(EntityKind, crate::mirror::MirrorStatus)> {
        vec![
            (EntityKind::Upgrades, self.reconcile::<Upgrade>().await),
            (EntityKind::Characters, self.reconcile::<Character>().await),
            (EntityKind::Levels, self.reconcile::<Level>().await),
        ]
    }
}

impl<S: Send + Sync> GameData<S> {
    pub async fn sync_kind<T>(&self) -> EntitySyncReport
    where
        T: GameEntity,
        S: RecordStore<T>,
    {
        let kind = T::KIND;
        let _guard = self.lock(kind).await;
        let mut report = EntitySyncReport::new(kind);

        let outcome = self.loader().load::<T>().await;
        report.warnings = outcome.warnings;
        report.loaded = outcome.records.len();

        match outcome.source {
            Some(source) => {
                report.source = Some(source);
                for record in &outcome.records {
                    match RecordStore::<T>::upsert(self.store_ref(), record).await {
                        Ok(()) => report.stored += 1,
                        Err(e) => {
                            report.store_failures += 1;
                            tracing::error!(%kind, key = %record.key(), error = %e, "Failed to store synced record");
                        }
                    }
                }
                T::cache(self.cache()).replace_all(outcome.records).await;

                if !outcome.canonical {
                    let mirror = self.write_mirror::<T>().await;
                    report.migrated_to_master = mirror.is_written();
                    if let Some(warning) = mirror.warning() {
                        report.warnings.push(warning);
                    }
                }
            }
            None => match RecordStore::<T>::load_all(self.store_ref()).await {
                Ok(records) => {
                    let seeded = records.len();
                    T::cache(self.cache()).replace_all(records).await;
                    report.seeded_from_database = true;
                    if seeded > 0 {
                        let mirror = self.write_mirror::<T>().await;
                        report.migrated_to_master = mirror.is_written();
                        if let Some(warning) = mirror.warning() {
                            report.warnings.push(warning);
                        }
                    }
                    tracing::info!(%kind, count = seeded, "No game-data file found, seeded cache from database");
                }
                Err(e) => {
                    tracing::error!(%kind, error = %e, "Failed to seed cache from database");
                    report.error = Some(e.to_string());
                }
            },
        }

        let (replayed, applied) = self.replay_pending_locked::<T>().await;
        report.replayed_intents = replayed;
        if replayed > 0 {
            let mirror = self.write_mirror::<T>().await;
            if mirror.is_canonical() {
                for path in &applied {
                    self.journal().clear(path).await;
                }
            }
            if let Some(warning) = mirror.warning() {
                report.warnings.push(warning);
            }
        }

        report.cached = T::cache(self.cache()).len().await;
        report
    }
}

#[cfg(test)]
mod tests {
    use classiklust_core::catalog::Level;
    use tempfile::TempDir;

    use super::*;
    use crate::journal::Intent;
    use crate::layout::DataLayout;
    use crate::store::memory::MemoryStore;

    fn level(n: i32, cost: i64) -> Level {
        Level {
            level: n,
            cost,
            requirements: vec![],
            unlocks: vec![],
        }
    }

    async fn write(path: std::path::PathBuf, contents: &str) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn legacy_file_is_loaded_and_migrated_to_master() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write(
            layout.legacy_file(EntityKind::Levels),
            r#"{"levels":[{"level":1,"cost":0},{"level":2,"cost":250}]}"#,
        )
        .await;
        let data = GameData::new(layout.clone(), MemoryStore::new());

        let report = data.sync_all().await;
        let levels = &report.entities[2];
        assert_eq!(levels.kind, EntityKind::Levels);
        assert_eq!(levels.stored, 2);
        assert!(levels.migrated_to_master);
        assert!(layout.master_file(EntityKind::Levels).exists());
        assert_eq!(data.list::<Level>().await.len(), 2);
        assert!(!report.has_errors());
    }

    #[tokio::test]
    async fn missing_files_seed_cache_from_database() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.insert_level(level(1, 0));
        let data = GameData::new(DataLayout::new(tmp.path()), store);

        let report = data.sync_kind::<Level>().await;
        assert!(report.seeded_from_database);
        assert_eq!(report.cached, 1);
        assert!(report.migrated_to_master);
    }

    #[tokio::test]
    async fn database_failure_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write(layout.master_file(EntityKind::Levels), r#"{"levels":[{"level":1,"cost":0}]}"#).await;
        let data = GameData::new(layout, MemoryStore::new());
        data.store_ref().set_failing(true);

        let report = data.sync_all().await;
        assert!(report.has_errors());
        assert_eq!(report.entities.len(), 3);
        assert_eq!(report.entities[2].store_failures, 1);
        // The file still seeds the cache so reads keep working.
        assert_eq!(data.list::<Level>().await.len(), 1);
    }

    #[tokio::test]
    async fn pending_intents_win_over_stale_master_file() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        write(layout.master_file(EntityKind::Levels), r#"{"levels":[{"level":1,"cost":0}]}"#).await;
        let data = GameData::new(layout, MemoryStore::new());
        data.journal()
            .record(&Intent::upsert(&level(1, 77)).unwrap())
            .await
            .unwrap();

        let report = data.sync_kind::<Level>().await;
        assert_eq!(report.replayed_intents, 1);
        assert_eq!(data.get::<Level>(&1).await.map(|l| l.cost), Some(77));
        assert_eq!(data.store_ref().level_rows(), vec![level(1, 77)]);
        assert_eq!(data.loader().load::<Level>().await.records, vec![level(1, 77)]);
        assert!(data.journal().pending(EntityKind::Levels).await.is_empty());
    }

    #[tokio::test]
    async fn superseded_intent_is_not_replayed_at_sync() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        let data = GameData::new(layout.clone(), MemoryStore::new());
        data.save(level(1, 0)).await.unwrap();

        // Master and legacy both blocked: the first edit diverges.
        let master = layout.master_file(EntityKind::Levels);
        let legacy = layout.legacy_file(EntityKind::Levels);
        tokio::fs::remove_file(&master).await.unwrap();
        tokio::fs::create_dir_all(master.join("blocked")).await.unwrap();
        tokio::fs::create_dir_all(legacy.join("blocked")).await.unwrap();
        assert!(!data.save(level(1, 500)).await.unwrap().mirror.is_written());

        tokio::fs::remove_dir_all(&master).await.unwrap();
        tokio::fs::remove_dir_all(&legacy).await.unwrap();
        assert!(data.save(level(1, 700)).await.unwrap().mirror.is_canonical());

        let report = data.sync_kind::<Level>().await;
        assert_eq!(report.replayed_intents, 0);
        assert_eq!(data.get::<Level>(&1).await.map(|l| l.cost), Some(700));
        assert_eq!(data.store_ref().level_rows(), vec![level(1, 700)]);
    }

    #[tokio::test]
    async fn intents_kept_after_fallback_write_replay_in_order() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        let data = GameData::new(layout.clone(), MemoryStore::new());
        data.save(level(1, 0)).await.unwrap();

        // Master blocked, legacy writable: edits land in the fallback file
        // while the master keeps the old cost.
        let master = layout.master_file(EntityKind::Levels);
        let stale = tokio::fs::read(&master).await.unwrap();
        tokio::fs::remove_file(&master).await.unwrap();
        tokio::fs::create_dir_all(master.join("blocked")).await.unwrap();
        data.save(level(1, 500)).await.unwrap();
        data.save(level(1, 700)).await.unwrap();
        assert_eq!(data.journal().pending(EntityKind::Levels).await.len(), 2);

        tokio::fs::remove_dir_all(&master).await.unwrap();
        tokio::fs::write(&master, stale).await.unwrap();

        let report = data.sync_kind::<Level>().await;
        assert_eq!(report.replayed_intents, 2);
        assert_eq!(data.get::<Level>(&1).await.map(|l| l.cost), Some(700));
        assert_eq!(data.store_ref().level_rows(), vec![level(1, 700)]);
        assert!(data.journal().pending(EntityKind::Levels).await.is_empty());
    }
}
