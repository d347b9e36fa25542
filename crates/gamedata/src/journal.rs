//! Write-ahead intents for the dual write.
//!
//! An intent is recorded before the database write and removed once the JSON
//! mirror has caught up. Anything left in the journal is a write whose mirror
//! state is unknown and is replayed on the next sync or reconcile.

use std::path::{Path, PathBuf};

use chrono::Utc;
use classiklust_core::catalog::EntityKind;
use classiklust_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::GameEntity;
use crate::error::GameDataError;
use crate::layout::DataLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum IntentOp {
    Upsert { record: Value },
    Delete { key: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub id: Uuid,
    pub kind: EntityKind,
    #[serde(flatten)]
    pub op: IntentOp,
    pub created_at: Timestamp,
}

impl Intent {
    pub fn upsert<T: GameEntity>(record: &T) -> Result<Self, GameDataError> {
        Ok(Self::new(T::KIND, IntentOp::Upsert {
            record: serde_json::to_value(record)?,
        }))
    }

    pub fn delete<T: GameEntity>(key: &T::Key) -> Result<Self, GameDataError> {
        Ok(Self::new(T::KIND, IntentOp::Delete {
            key: serde_json::to_value(key)?,
        }))
    }

    fn new(kind: EntityKind, op: IntentOp) -> Self {
        Self {
            // v7 ids sort in creation order within the process.
            id: Uuid::now_v7(),
            kind,
            op,
            created_at: Utc::now(),
        }
    }
}

/// A pending intent and the file that holds it.
#[derive(Debug, Clone)]
pub struct PendingIntent {
    pub path: PathBuf,
    pub intent: Intent,
}

pub struct IntentJournal {
    dir: PathBuf,
}

impl IntentJournal {
    pub fn new(layout: &DataLayout) -> Self {
        Self {
            dir: layout.journal_dir(),
        }
    }

    /// Persist `intent`. A failure here aborts the write before the database
    /// is touched.
    pub async fn record(&self, intent: &Intent) -> Result<PathBuf, GameDataError> {
        let path = self.dir.join(format!("{}-{}.json", intent.kind, intent.id));
        crate::mirror::write_json_atomic(&path, intent)
            .await
            .map_err(|e| GameDataError::io(&path, e))?;
        Ok(path)
    }

    /// Remove a completed or abandoned intent. Failures are logged only; a
    /// leftover intent is replayed idempotently later.
    pub async fn clear(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to clear journal intent"),
        }
    }

    /// Remove every pending intent for `kind`. Called once the mirror has been
    /// rewritten from the full cache, which supersedes all of them.
    pub async fn clear_kind(&self, kind: EntityKind) -> usize {
        let pending = self.pending(kind).await;
        for entry in &pending {
            self.clear(&entry.path).await;
        }
        pending.len()
    }

    /// Pending intents for `kind`, oldest first. Unreadable entries are
    /// logged and skipped.
    pub async fn pending(&self, kind: EntityKind) -> Vec<PendingIntent> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Cannot read intent journal");
                return Vec::new();
            }
        };

        let prefix = format!("{kind}-");
        let mut pending = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }
            let path = entry.path();
            let parsed = tokio::fs::read(&path)
                .await
                .map_err(|e| e.to_string())
                .and_then(|b| serde_json::from_slice::<Intent>(&b).map_err(|e| e.to_string()));
            match parsed {
                Ok(intent) => pending.push(PendingIntent { path, intent }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable intent"),
            }
        }
        pending.sort_by_key(|p| (p.intent.created_at, p.intent.id));
        pending
    }
}

#[cfg(test)]
mod tests {
    use classiklust_core::catalog::Level;
    use tempfile::TempDir;

    use super::*;

    fn level() -> Level {
        Level {
            level: 2,
            cost: 500,
            requirements: vec![],
            unlocks: vec![],
        }
    }

    #[tokio::test]
    async fn recorded_intents_are_pending_until_cleared() {
        let tmp = TempDir::new().unwrap();
        let journal = IntentJournal::new(&DataLayout::new(tmp.path()));

        let first = journal.record(&Intent::upsert(&level()).unwrap()).await.unwrap();
        journal.record(&Intent::delete::<Level>(&3).unwrap()).await.unwrap();

        let pending = journal.pending(EntityKind::Levels).await;
        assert_eq!(pending.len(), 2);
        assert!(matches!(pending[0].intent.op, IntentOp::Upsert { .. }));
        assert_eq!(pending[1].intent.op, IntentOp::Delete { key: serde_json::json!(3) });
        assert!(journal.pending(EntityKind::Upgrades).await.is_empty());

        journal.clear(&first).await;
        assert_eq!(journal.pending(EntityKind::Levels).await.len(), 1);
    }

    #[tokio::test]
    async fn clear_kind_leaves_other_kinds_alone() {
        let tmp = TempDir::new().unwrap();
        let journal = IntentJournal::new(&DataLayout::new(tmp.path()));
        journal.record(&Intent::upsert(&level()).unwrap()).await.unwrap();
        journal.record(&Intent::delete::<Level>(&3).unwrap()).await.unwrap();
        journal
            .record(&Intent::delete::<classiklust_core::catalog::Upgrade>(&"tap".to_string()).unwrap())
            .await
            .unwrap();

        assert_eq!(journal.clear_kind(EntityKind::Levels).await, 2);
        assert!(journal.pending(EntityKind::Levels).await.is_empty());
        assert_eq!(journal.pending(EntityKind::Upgrades).await.len(), 1);
    }

    #[tokio::test]
    async fn missing_journal_dir_means_nothing_pending() {
        let tmp = TempDir::new().unwrap();
        let journal = IntentJournal::new(&DataLayout::new(tmp.path()));
        assert!(journal.pending(EntityKind::Characters).await.is_empty());
    }
}
