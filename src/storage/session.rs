//! Session - a scoped unit of work on its own connection
//!
//! The first write of a session opens a transaction, which stays open until
//! [`Session::commit`] or [`Session::rollback`]. Reads outside a write
//! transaction run in autocommit mode and hold no lock afterwards. Nothing
//! is committed implicitly: a session released with an open transaction
//! rolls it back.

use rusqlite::{Connection, OptionalExtension, params};

use super::engine::Engine;
use super::schema::NOW_EXPR;
use crate::post::{NewPost, Post, PostChanges};
use crate::{Error, Result};

pub struct Session {
    conn: Option<Connection>,
    engine: Engine,
    id: usize,
}

impl Session {
    pub(crate) fn new(conn: Connection, engine: Engine, id: usize) -> Self {
        Self {
            conn: Some(conn),
            engine,
            id,
        }
    }

    /// Sequence number of this session within its engine
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// True while a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| !conn.is_autocommit())
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::SessionClosed)
    }

    /// Connection with a write transaction open
    fn begin(&self) -> Result<&Connection> {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN DEFERRED")?;
            tracing::debug!(session = self.id, "transaction started");
        }
        Ok(conn)
    }

    // ========== Post Operations ==========

    /// Insert a post. The store assigns `id` and both timestamps.
    pub fn create(&self, new_post: &NewPost) -> Result<Post> {
        let conn = self.begin()?;
        let post = conn.query_row(
            &format!(
                "INSERT INTO posts (title, content) VALUES (?1, ?2) RETURNING {}",
                Post::COLUMNS
            ),
            params![new_post.title, new_post.content],
            Post::from_row,
        )?;

        tracing::debug!(session = self.id, post = post.id, "post created");
        Ok(post)
    }

    /// Get a post by id
    pub fn get(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1", Post::COLUMNS),
            [id],
            Post::from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Apply `changes` to a post and refresh its `updated_at`.
    ///
    /// An empty change set leaves the row untouched.
    pub fn update(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        if changes.is_empty() {
            return self.get(id);
        }

        let conn = self.begin()?;
        let post = conn
            .query_row(
                &format!(
                    r#"
                    UPDATE posts
                    SET title = COALESCE(?1, title),
                        content = COALESCE(?2, content),
                        updated_at = max({NOW_EXPR}, updated_at)
                    WHERE id = ?3
                    RETURNING {}
                    "#,
                    Post::COLUMNS
                ),
                params![changes.title, changes.content, id],
                Post::from_row,
            )
            .optional()?;

        if post.is_some() {
            tracing::debug!(session = self.id, post = id, "post updated");
        }
        Ok(post)
    }

    /// Delete a post by id. Returns false if there was nothing to delete.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.begin()?;
        let removed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    /// All posts in id order
    pub fn list(&self) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM posts ORDER BY id", Post::COLUMNS))?;

        let posts = stmt
            .query_map([], Post::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(posts)
    }

    /// Count all posts
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Transaction Control ==========

    /// Commit the open transaction, if any
    pub fn commit(&self) -> Result<()> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
            tracing::debug!(session = self.id, "transaction committed");
        }
        Ok(())
    }

    /// Discard the open transaction, if any
    pub fn rollback(&self) -> Result<()> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
            tracing::debug!(session = self.id, "transaction rolled back");
        }
        Ok(())
    }

    /// Release the session. Uncommitted work is rolled back.
    ///
    /// Closing twice is a no-op; the release is recorded only once.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        self.engine.record_release(self.id);

        if !conn.is_autocommit() {
            tracing::warn!(session = self.id, "session released with uncommitted changes, rolling back");
            conn.execute_batch("ROLLBACK")?;
        }
        conn.close().map_err(|(_, err)| Error::from(err))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(session = self.id, "failed to release session: {}", e);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
