//! Post model - the single entity persisted by blogdb
//!
//! `id`, `created_at` and `updated_at` are owned by the store. Callers
//! supply `title` and `content` through [`NewPost`] and change them through
//! [`PostChanges`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage format of timestamps (UTC, millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A persisted blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Column list matching [`Post::from_row`]
    pub(crate) const COLUMNS: &'static str = "id, title, content, created_at, updated_at";

    /// Helper to convert a row selected with [`Post::COLUMNS`] to a Post
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let created_str: String = row.get(3)?;
        let updated_str: String = row.get(4)?;

        let created_at = parse_timestamp(&created_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let updated_at = parse_timestamp(&updated_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at,
            updated_at,
        })
    }
}

/// Values for a post that does not exist yet.
///
/// Fields are optional so that a missing value reaches the store and is
/// rejected there as a NOT NULL violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }
}

/// Column changes applied to an existing post. `None` leaves a column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Parse a stored timestamp. Accepts both the space and `T` separators.
pub fn parse_timestamp(s: &str) -> crate::Result<DateTime<Utc>> {
    let normalized = s.replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| crate::Error::Timestamp(format!("{s}: {e}")))
}

/// Format a timestamp the way the store writes it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
