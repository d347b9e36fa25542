use std::path::{Path, PathBuf};

use classiklust_core::catalog::EntityKind;

/// On-disk layout of the game-data directory.
///
/// ```text
/// <root>/master-data/<kind>-master.json   canonical master files
/// <root>/.journal/                        write-ahead intents
/// <root>/<kind>.json                      legacy root-level files
/// <root>/<kind>/*.json                    one record per file
/// <root>/player-data/<folder>/player.json player snapshots
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn master_dir(&self) -> PathBuf {
        self.root.join("master-data")
    }

    pub fn master_file(&self, kind: EntityKind) -> PathBuf {
        self.master_dir().join(format!("{kind}-master.json"))
    }

    pub fn legacy_file(&self, kind: EntityKind) -> PathBuf {
        self.root.join(format!("{kind}.json"))
    }

    pub fn item_dir(&self, kind: EntityKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.root.join(".journal")
    }

    pub fn player_data_dir(&self) -> PathBuf {
        self.root.join("player-data")
    }
}
