//! Player session model and DTOs.

use classiklust_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A session row from the `sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub token_hash: String,
    pub player_id: DbId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl Session {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub player_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
