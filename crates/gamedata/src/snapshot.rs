//! Per-player JSON snapshots under `<root>/player-data/<folder>/player.json`.
//!
//! Snapshots are an operator convenience. The database remains authoritative
//! and callers treat write failures as warnings.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::GameDataError;
use crate::layout::DataLayout;
use crate::mirror::write_json_atomic;

#[derive(Debug, Clone)]
pub struct PlayerSnapshotWriter {
    root: PathBuf,
}

impl PlayerSnapshotWriter {
    pub fn new(layout: &DataLayout) -> Self {
        Self {
            root: layout.player_data_dir(),
        }
    }

    /// Folder name for a player: `telegram_<id>`, `dev_<handle>`, or
    /// `player_<id>` when neither identity is known.
    pub fn folder_for(telegram_id: Option<&str>, dev_handle: Option<&str>, player_id: i64) -> String {
        match (telegram_id, dev_handle) {
            (Some(tg), _) => format!("telegram_{tg}"),
            (None, Some(handle)) => format!("dev_{handle}"),
            (None, None) => format!("player_{player_id}"),
        }
    }

    pub fn path_for(&self, folder: &str) -> PathBuf {
        self.root.join(folder).join("player.json")
    }

    pub async fn write<V: Serialize + ?Sized>(&self, folder: &str, snapshot: &V) -> Result<PathBuf, GameDataError> {
        let path = self.path_for(folder);
        write_json_atomic(&path, snapshot)
            .await
            .map_err(|e| GameDataError::io(&path, e))?;
        tracing::debug!(path = %path.display(), "Wrote player snapshot");
        Ok(path)
    }
}
