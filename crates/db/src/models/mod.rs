//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the DTOs its repository accepts.

pub mod catalog;
pub mod media;
pub mod player;
pub mod session;
