//! Database schema definitions

use rusqlite::Connection;
use crate::{Error, Result};

/// Table holding blog posts
pub const POSTS_TABLE: &str = "posts";

/// SQLite expression for the current time in the stored timestamp format
pub const NOW_EXPR: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// SQL to create the posts table
///
/// Both timestamp defaults are evaluated within the same statement, so a
/// fresh row always has `created_at == updated_at`.
pub const CREATE_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    CHECK (created_at <= updated_at)
)
"#;

/// Refresh `updated_at` when a row changes through a statement that did
/// not set it itself.
pub const CREATE_TOUCH_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS posts_touch_updated_at
AFTER UPDATE OF title, content ON posts
FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE posts
    SET updated_at = max(strftime('%Y-%m-%d %H:%M:%f', 'now'), OLD.updated_at)
    WHERE id = NEW.id;
END
"#;

/// `id` and `created_at` are fixed once the row exists
pub const CREATE_IMMUTABLE_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS posts_immutable_columns
BEFORE UPDATE OF id, created_at ON posts
FOR EACH ROW WHEN NEW.id IS NOT OLD.id OR NEW.created_at IS NOT OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'posts.id and posts.created_at are immutable');
END
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at)",
];

/// Triggers and indexes, applied once the table matches the mapping
pub fn dependent_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_TOUCH_TRIGGER, CREATE_IMMUTABLE_TRIGGER];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// One mapped column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str, not_null: bool, primary_key: bool) -> Self {
        Self { name, sql_type, not_null, primary_key }
    }
}

/// Column mapping for [`crate::Post`], in declaration order
pub const POST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "INTEGER", false, true),
    ColumnDef::new("title", "TEXT", true, false),
    ColumnDef::new("content", "TEXT", true, false),
    ColumnDef::new("created_at", "TEXT", true, false),
    ColumnDef::new("updated_at", "TEXT", true, false),
];

/// Create the posts table if missing, check it against [`POST_COLUMNS`],
/// then install its triggers and indexes
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_POSTS_TABLE, [])?;
    validate(conn)?;
    for stmt in dependent_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

/// Compare the live `posts` table against [`POST_COLUMNS`]
pub fn validate(conn: &Connection) -> Result<()> {
    let live = table_columns(conn, POSTS_TABLE)?;

    if live.is_empty() {
        return Err(Error::SchemaMismatch(format!("table '{}' does not exist", POSTS_TABLE)));
    }
    if live.len() != POST_COLUMNS.len() {
        return Err(Error::SchemaMismatch(format!(
            "table '{}' has {} columns, expected {}",
            POSTS_TABLE,
            live.len(),
            POST_COLUMNS.len()
        )));
    }

    for (expected, actual) in POST_COLUMNS.iter().zip(live.iter()) {
        if expected.name != actual.name
            || !expected.sql_type.eq_ignore_ascii_case(&actual.sql_type)
            || expected.not_null != actual.not_null
            || expected.primary_key != actual.primary_key
        {
            return Err(Error::SchemaMismatch(format!(
                "column '{}' is {:?}, expected {:?}",
                actual.name, actual, expected
            )));
        }
    }

    Ok(())
}

/// A column as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<LiveColumn>> {
    let mut stmt = conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;

    let columns = stmt
        .query_map([table], |row| {
            let not_null: i64 = row.get(2)?;
            let pk: i64 = row.get(3)?;
            Ok(LiveColumn {
                name: row.get(0)?,
                sql_type: row.get(1)?,
                not_null: not_null != 0,
                primary_key: pk != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(columns)
}
