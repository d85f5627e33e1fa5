//! Engine - the process-wide connection target
//!
//! An [`Engine`] holds configuration only. Every [`Session`] it hands out
//! opens its own connection, since a SQLite connection is never shared
//! between threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rusqlite::{Connection, DatabaseName};
use serde::Serialize;

use super::schema;
use super::session::Session;
use crate::{Error, Result};

/// Default location of the backing store, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "blog.db";

/// Default time a connection waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Connection settings shared by every session of an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub path: PathBuf,
    /// Trace every SQL statement at debug level
    pub echo: bool,
    pub busy_timeout: Duration,
}

impl StorageConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: false,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}

/// Session bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub opened: usize,
    pub released: usize,
}

impl SessionStats {
    /// Sessions acquired and not yet released
    pub fn open(&self) -> usize {
        self.opened.saturating_sub(self.released)
    }
}

#[derive(Debug)]
struct EngineInner {
    config: StorageConfig,
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// Configured connection target. Cheap to clone; clones share counters.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Initialize the engine: create the database file if needed, apply
    /// the schema and validate the column mapping.
    ///
    /// Any failure here means the process cannot use its store.
    pub fn open(config: StorageConfig) -> Result<Self> {
        if let Some(dir) = missing_store_dir(&config.path) {
            std::fs::create_dir_all(dir)?;
            tracing::debug!("created directory {:?} for the database", dir);
        }

        let init_failure = |source| Error::Init {
            path: config.path.display().to_string(),
            source,
        };
        let conn = bootstrap(&config).map_err(init_failure)?;
        // A file that is not a database only shows up once the schema is read
        schema::initialize(&conn).map_err(|err| match err {
            Error::Storage(source) => init_failure(source),
            other => other,
        })?;
        drop(conn);

        tracing::info!("Using SQLite database at {:?}", config.path);

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }),
        })
    }

    /// Open the store at `path` with default settings
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(StorageConfig::new(path))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }

    /// Acquire a session on a fresh connection. It is released on drop.
    pub fn session(&self) -> Result<Session> {
        let conn = connect(&self.inner.config)?;
        let id = self.inner.opened.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(session = id, "session opened");
        Ok(Session::new(conn, self.clone(), id))
    }

    /// Run `f` inside a session and release it afterwards, whatever `f`
    /// returns. Writes that `f` did not commit are rolled back.
    pub fn with_session<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Session) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut session = self.session()?;
        let result = f(&mut session);
        let closed = session.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn session_stats(&self) -> SessionStats {
        // Released first, so a release racing this call cannot outrun its open
        let released = self.inner.released.load(Ordering::SeqCst);
        let opened = self.inner.opened.load(Ordering::SeqCst);
        SessionStats { opened, released }
    }

    pub(crate) fn record_release(&self, id: usize) {
        self.inner.released.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(session = id, "session released");
    }
}

fn connect(config: &StorageConfig) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(&config.path)?;
    conn.busy_timeout(config.busy_timeout)?;
    if config.echo {
        conn.trace(Some(trace_sql));
    }
    Ok(conn)
}

/// First connection of an engine; the file must be writable
fn bootstrap(config: &StorageConfig) -> rusqlite::Result<Connection> {
    let conn = connect(config)?;
    ensure_writable(&conn)?;
    Ok(conn)
}

/// SQLite silently falls back to read-only when it cannot write the file
fn ensure_writable(conn: &Connection) -> rusqlite::Result<()> {
    if conn.is_readonly(DatabaseName::Main)? {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
            Some("database file is not writable".to_string()),
        ));
    }
    Ok(())
}

fn trace_sql(sql: &str) {
    tracing::debug!(target: "blogdb::sql", "{}", sql);
}

/// Directory that must be created before the database file can be
fn missing_store_dir(db_path: &Path) -> Option<&Path> {
    db_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists())
}
