//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that also run inside player transactions accept any
//! [`sqlx::PgExecutor`]; the rest take `&PgPool` directly.

pub mod catalog_repo;
pub mod media_repo;
pub mod player_repo;
pub mod player_upgrade_repo;
pub mod session_repo;

pub use catalog_repo::{CharacterRepo, LevelRepo, UpgradeRepo};
pub use media_repo::MediaRepo;
pub use player_repo::PlayerRepo;
pub use player_upgrade_repo::PlayerUpgradeRepo;
pub use session_repo::SessionRepo;
