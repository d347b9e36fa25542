//! Domain core for the ClassikLust game backend.
//!
//! Zero internal dependencies: pure types and functions shared by the
//! database layer, the game-data sync crate and the HTTP API.

pub mod catalog;
pub mod error;
pub mod game;
pub mod hashing;
pub mod media;
pub mod session;
pub mod telegram;
pub mod types;
