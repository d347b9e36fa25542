//! Where catalog records are read from at sync time.
//!
//! Sources are tried in order; the first one that yields a well-formed
//! collection wins. A missing file is silent, a malformed file is a warning
//! and the next source is tried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use classiklust_core::catalog::EntityKind;
use serde_json::Value;

use crate::entity::GameEntity;
use crate::layout::DataLayout;

/// Raw result of asking one source for a collection.
#[derive(Debug)]
pub enum SourceRead {
    /// The source has this collection (possibly empty).
    Found(Vec<Value>),
    /// Nothing here for this kind.
    Absent,
    /// The source exists but could not be parsed.
    Malformed(String),
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable label used in logs and sync reports.
    fn describe(&self, kind: EntityKind) -> String;

    /// Whether this is the canonical master location.
    fn is_canonical(&self) -> bool {
        false
    }

    /// Whether a collection with no valid records counts as "not found".
    fn requires_records(&self) -> bool {
        false
    }

    async fn read(&self, kind: EntityKind) -> SourceRead;
}

/// `<root>/master-data/<kind>-master.json`
pub struct MasterFileSource {
    layout: DataLayout,
}

impl MasterFileSource {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl DataSource for MasterFileSource {
    fn describe(&self, kind: EntityKind) -> String {
        self.layout.master_file(kind).display().to_string()
    }

    fn is_canonical(&self) -> bool {
        true
    }

    async fn read(&self, kind: EntityKind) -> SourceRead {
        read_collection_file(&self.layout.master_file(kind), kind).await
    }
}

/// `<root>/<kind>.json`
pub struct LegacyFileSource {
    layout: DataLayout,
}

impl LegacyFileSource {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl DataSource for LegacyFileSource {
    fn describe(&self, kind: EntityKind) -> String {
        self.layout.legacy_file(kind).display().to_string()
    }

    async fn read(&self, kind: EntityKind) -> SourceRead {
        read_collection_file(&self.layout.legacy_file(kind), kind).await
    }
}

/// `<root>/<kind>/*.json`, one record object per file, read in file-name order.
pub struct DirectorySource {
    layout: DataLayout,
}

impl DirectorySource {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    fn describe(&self, kind: EntityKind) -> String {
        format!("{}/*.json", self.layout.item_dir(kind).display())
    }

    fn requires_records(&self) -> bool {
        true
    }

    async fn read(&self, kind: EntityKind) -> SourceRead {
        let dir = self.layout.item_dir(kind);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SourceRead::Absent,
            Err(e) => return SourceRead::Malformed(format!("{}: {e}", dir.display())),
        };

        let mut files: Vec<PathBuf> = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => return SourceRead::Malformed(format!("{}: {e}", dir.display())),
            }
        }
        if files.is_empty() {
            return SourceRead::Absent;
        }
        files.sort();

        let mut records = Vec::with_capacity(files.len());
        for file in files {
            let parsed = tokio::fs::read(&file)
                .await
                .map_err(|e| e.to_string())
                .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()));
            match parsed {
                Ok(value) => records.push(value),
                // One bad item file is skipped, the rest of the directory still counts.
                Err(e) => tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable item file"),
            }
        }
        SourceRead::Found(records)
    }
}

/// A collection file is an object holding the records under the kind's key,
/// e.g. `{"upgrades": [...]}`.
async fn read_collection_file(path: &Path, kind: EntityKind) -> SourceRead {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SourceRead::Absent,
        Err(e) => return SourceRead::Malformed(format!("{}: {e}", path.display())),
    };

    let document: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => return SourceRead::Malformed(format!("{}: invalid JSON: {e}", path.display())),
    };

    match document.get(kind.as_str()) {
        Some(Value::Array(items)) => SourceRead::Found(items.clone()),
        Some(_) => SourceRead::Malformed(format!(
            "{}: \"{kind}\" is not an array",
            path.display()
        )),
        None => SourceRead::Malformed(format!(
            "{}: missing top-level \"{kind}\" array",
            path.display()
        )),
    }
}

/// The standard source order: master file, legacy file, item directory.
pub fn default_sources(layout: &DataLayout) -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(MasterFileSource::new(layout.clone())),
        Box::new(LegacyFileSource::new(layout.clone())),
        Box::new(DirectorySource::new(layout.clone())),
    ]
}

/// Typed result of loading one kind.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub records: Vec<T>,
    /// Label of the source that resolved, `None` when nothing did.
    pub source: Option<String>,
    pub canonical: bool,
    pub warnings: Vec<String>,
}

/// Walks the configured sources in order and turns raw JSON into validated
/// records.
pub struct MasterFileLoader {
    sources: Vec<Box<dyn DataSource>>,
}

impl MasterFileLoader {
    pub fn new(sources: Vec<Box<dyn DataSource>>) -> Self {
        Self { sources }
    }

    pub fn with_defaults(layout: &DataLayout) -> Self {
        Self::new(default_sources(layout))
    }

    pub async fn load<T: GameEntity>(&self) -> LoadOutcome<T> {
        let kind = T::KIND;
        let mut warnings = Vec::new();

        for source in &self.sources {
            let label = source.describe(kind);
            match source.read(kind).await {
                SourceRead::Absent => continue,
                SourceRead::Malformed(reason) => {
                    tracing::warn!(%kind, source = %label, %reason, "Malformed game-data source");
                    warnings.push(reason);
                }
                SourceRead::Found(raw) => {
                    let records = decode_records::<T>(raw, &label, &mut warnings);
                    if records.is_empty() && source.requires_records() {
                        continue;
                    }
                    tracing::info!(%kind, source = %label, count = records.len(), "Loaded game data");
                    return LoadOutcome {
                        records,
                        source: Some(label),
                        canonical: source.is_canonical(),
                        warnings,
                    };
                }
            }
        }

        LoadOutcome {
            records: Vec::new(),
            source: None,
            canonical: false,
            warnings,
        }
    }
}

/// Deserialize and validate each raw record, skipping the bad ones. Duplicate
/// keys keep the last occurrence.
fn decode_records<T: GameEntity>(raw: Vec<Value>, label: &str, warnings: &mut Vec<String>) -> Vec<T> {
    let mut by_key: BTreeMap<T::Key, T> = BTreeMap::new();

    for (index, value) in raw.into_iter().enumerate() {
        let record: T = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warnings.push(format!("{label}[{index}]: {e}"));
                continue;
            }
        };
        if let Err(errors) = record.validate() {
            warnings.push(format!(
                "{label}[{index}] ({}): {}",
                record.key(),
                classiklust_core::error::describe_validation_errors(&errors)
            ));
            continue;
        }
        if by_key.insert(record.key(), record).is_some() {
            warnings.push(format!("{label}[{index}]: duplicate key, later entry kept"));
        }
    }

    by_key.into_values().collect()
}
