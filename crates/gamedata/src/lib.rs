//! Game-data synchronization between JSON master files, Postgres and an
//! in-memory cache.
//!
//! - [`source`] -- ordered data sources (master file, legacy file, per-item directory)
//! - [`cache`] -- per-kind in-memory record maps
//! - [`journal`] -- write-ahead intents for the dual write
//! - [`mirror`] -- atomic JSON mirror writes
//! - [`store`] -- the relational side behind the [`store::RecordStore`] seam
//! - [`service`] -- [`service::GameData`], the dual-write persister
//! - [`sync`] -- startup / resync orchestration
//! - [`snapshot`] -- per-player JSON snapshots

pub mod cache;
pub mod entity;
pub mod error;
pub mod journal;
pub mod layout;
pub mod mirror;
pub mod service;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod sync;

pub use cache::{EntityCache, GameDataCache};
pub use entity::GameEntity;
pub use error::GameDataError;
pub use layout::DataLayout;
pub use mirror::MirrorStatus;
pub use service::{DeleteOutcome, GameData, SaveOutcome};
pub use store::{CatalogStore, PgCatalogStore, RecordStore};
pub use sync::{EntitySyncReport, SyncReport};
