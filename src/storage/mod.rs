//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite file with one table:
//! - posts(id, title, content, created_at, updated_at)
//!
//! The [`Engine`] is the connection target; [`Session`]s are the units of
//! work callers read and write through.

pub mod schema;
pub mod engine;
pub mod session;

pub use engine::{Engine, SessionStats, StorageConfig, DEFAULT_DATABASE_PATH};
pub use session::Session;
