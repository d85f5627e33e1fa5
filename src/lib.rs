//! # blogdb - Blog persistence layer
//!
//! SQLite-backed storage for a blog application.
//!
//! blogdb provides:
//! - An explicitly constructed [`Engine`] owning the connection target
//! - Scoped [`Session`]s with manual transaction control, released on drop
//! - The [`Post`] model with store-managed `created_at`/`updated_at`
//! - A column mapping table validated against the live store at startup

pub mod post;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use post::{NewPost, Post, PostChanges};
pub use storage::{Engine, Session, SessionStats, StorageConfig};

/// Result type alias for blogdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for blogdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot initialize database at {path}: {source}")]
    Init {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi_err, msg)
                if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(msg.unwrap_or_else(|| ffi_err.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

impl Error {
    /// True for writes rejected by a NOT NULL, CHECK or trigger rule
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}
