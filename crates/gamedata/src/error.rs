use std::path::PathBuf;

use classiklust_core::catalog::EntityKind;
use classiklust_core::error::CoreError;

/// Errors from the game-data layer.
#[derive(Debug, thiserror::Error)]
pub enum GameDataError {
    /// A record failed its validation rules.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No cached record with this key.
    #[error("{kind} record {key} not found")]
    NotFound { kind: EntityKind, key: String },

    /// The relational store rejected the write.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure outside the best-effort mirror path (journal writes).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for GameDataError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GameDataError::Validation(classiklust_core::error::describe_validation_errors(&errors))
    }
}

impl GameDataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GameDataError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map to the domain error taxonomy. Database errors are returned
    /// separately so the HTTP layer can classify them.
    pub fn into_core(self) -> Result<CoreError, sqlx::Error> {
        match self {
            GameDataError::Validation(msg) => Ok(CoreError::Validation(msg)),
            GameDataError::NotFound { kind, key } => Ok(CoreError::NotFound {
                entity: kind.entity_name(),
                id: key,
            }),
            GameDataError::Database(err) => Err(err),
            other => Ok(CoreError::Internal(other.to_string())),
        }
    }
}
