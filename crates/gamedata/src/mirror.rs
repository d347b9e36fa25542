//! JSON mirror writes.
//!
//! Files are written to a sibling temp file and renamed into place, so a
//! reader never observes a half-written master file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::entity::GameEntity;
use crate::layout::DataLayout;

/// Whether the JSON mirror matches the database after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MirrorStatus {
    /// The mirror was rewritten. `fallback` is set when the master location
    /// failed and the legacy file was written instead.
    #[serde(rename_all = "camelCase")]
    Written { path: PathBuf, fallback: bool },
    /// Neither location could be written; the database is ahead of the mirror.
    Diverged { reason: String },
}

impl MirrorStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, MirrorStatus::Written { .. })
    }

    /// Written to the master file, which is what the next sync loads first.
    pub fn is_canonical(&self) -> bool {
        matches!(self, MirrorStatus::Written { fallback: false, .. })
    }

    /// Operator-facing warning, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            MirrorStatus::Written { path, fallback: true } => Some(format!(
                "master file unavailable, wrote fallback mirror {}",
                path.display()
            )),
            MirrorStatus::Written { .. } => None,
            MirrorStatus::Diverged { reason } => {
                Some(format!("JSON mirror not updated: {reason}"))
            }
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub async fn write_json_atomic<V: Serialize + ?Sized>(path: &Path, value: &V) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Rewrite the mirror for `T::KIND` from `records`.
pub async fn write_collection<T: GameEntity>(layout: &DataLayout, records: &[T]) -> MirrorStatus {
    let kind = T::KIND;
    let mut document = serde_json::Map::new();
    document.insert(
        kind.as_str().to_string(),
        match serde_json::to_value(records) {
            Ok(v) => v,
            Err(e) => return MirrorStatus::Diverged { reason: e.to_string() },
        },
    );
    document.insert(
        "updatedAt".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );

    let master = layout.master_file(kind);
    let master_err = match write_json_atomic(&master, &document).await {
        Ok(()) => {
            return MirrorStatus::Written {
                path: master,
                fallback: false,
            }
        }
        Err(e) => e,
    };
    tracing::warn!(%kind, path = %master.display(), error = %master_err, "Master file write failed, trying legacy path");

    let legacy = layout.legacy_file(kind);
    match write_json_atomic(&legacy, &document).await {
        Ok(()) => MirrorStatus::Written {
            path: legacy,
            fallback: true,
        },
        Err(legacy_err) => {
            tracing::error!(%kind, error = %legacy_err, "JSON mirror write failed");
            MirrorStatus::Diverged {
                reason: format!("{}: {master_err}; {}: {legacy_err}", master.display(), legacy.display()),
            }
        }
    }
}
