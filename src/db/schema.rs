//! Database schema definitions and initialization.
//!
//! This module defines the SQLite schema for journal entries, the mood and
//! tag reference sets, their association tables and the PIN credential, and
//! seeds the fixed reference data.

use crate::constants::{SEED_MOODS, SEED_TAGS};
use crate::db::begin_write;
use crate::db::tags::tag_key;
use crate::errors::{AppResult, StorageError};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Number of rows newly inserted by a seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub moods_inserted: usize,
    pub tags_inserted: usize,
}

/// Creates all database tables and indexes.
///
/// This function is idempotent - it uses `CREATE TABLE IF NOT EXISTS`
/// so it's safe to call multiple times.
///
/// # Tables
///
/// - `journal_entries`: One row per calendar day
/// - `moods`: Fixed mood reference set
/// - `entry_moods`: Entry to mood links with a primary flag
/// - `tags`: Pre-built and custom tags
/// - `entry_tags`: Entry to tag links, unique per pair
/// - `users`: The PIN credential (at most one row)
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    debug!("Creating database tables");

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(StorageError::Sqlite)?;

    // entry_date holds YYYY-MM-DD only, so UNIQUE is a per-day constraint
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS journal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            entry_date TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_journal_entries_date ON journal_entries(entry_date DESC);
        "#,
    )
    .map_err(StorageError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS moods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL CHECK(category IN ('Positive', 'Neutral', 'Negative'))
        );

        CREATE TABLE IF NOT EXISTS entry_moods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            mood_id INTEGER NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0 CHECK(is_primary IN (0, 1)),
            FOREIGN KEY (entry_id) REFERENCES journal_entries(id) ON DELETE CASCADE,
            FOREIGN KEY (mood_id) REFERENCES moods(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_entry_moods_entry_id ON entry_moods(entry_id);
        CREATE INDEX IF NOT EXISTS idx_entry_moods_mood_id ON entry_moods(mood_id);
        "#,
    )
    .map_err(StorageError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL COLLATE NOCASE,
            name_key TEXT NOT NULL UNIQUE,
            is_pre_built INTEGER NOT NULL DEFAULT 0 CHECK(is_pre_built IN (0, 1))
        );

        CREATE TABLE IF NOT EXISTS entry_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            FOREIGN KEY (entry_id) REFERENCES journal_entries(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
            UNIQUE(entry_id, tag_id)
        );

        CREATE INDEX IF NOT EXISTS idx_entry_tags_tag_id ON entry_tags(tag_id);
        "#,
    )
    .map_err(StorageError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            pin_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(StorageError::Sqlite)?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .map_err(StorageError::Sqlite)?;

    let current_version = get_schema_version(conn)?;
    if current_version.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?)",
            [SCHEMA_VERSION],
        )
        .map_err(StorageError::Sqlite)?;
        info!("Initialized database schema version {}", SCHEMA_VERSION);
    } else {
        debug!("Schema version already recorded: {:?}", current_version);
    }

    debug!("Database tables created successfully");
    Ok(())
}

/// Gets the current schema version from the database.
///
/// Returns `None` if the schema_version table doesn't exist or is empty.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than missing table.
pub fn get_schema_version(conn: &Connection) -> AppResult<Option<i32>> {
    let result = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY applied_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional();

    match result {
        Ok(version) => Ok(version),
        Err(e) if e.to_string().contains("no such table") => Ok(None),
        Err(e) => Err(StorageError::Sqlite(e).into()),
    }
}

/// Seeds the fixed moods and pre-built tags.
///
/// Rows are keyed on their unique names, so a name that already exists is
/// skipped. Re-running this against a populated store inserts nothing.
///
/// # Errors
///
/// Returns an error if an insert fails; nothing from this pass is kept.
pub fn seed_reference_data(conn: &mut Connection) -> AppResult<SeedReport> {
    let tx = begin_write(conn)?;
    let mut report = SeedReport::default();

    for (name, category) in SEED_MOODS {
        report.moods_inserted += tx
            .execute(
                "INSERT OR IGNORE INTO moods (name, category) VALUES (?1, ?2)",
                params![name, category],
            )
            .map_err(StorageError::Sqlite)?;
    }

    for name in SEED_TAGS {
        report.tags_inserted += tx
            .execute(
                "INSERT OR IGNORE INTO tags (name, name_key, is_pre_built) VALUES (?1, ?2, 1)",
                params![name, tag_key(name)],
            )
            .map_err(StorageError::Sqlite)?;
    }

    tx.commit().map_err(StorageError::Sqlite)?;

    if report.moods_inserted > 0 || report.tags_inserted > 0 {
        info!(
            "Seeded {} moods and {} pre-built tags",
            report.moods_inserted, report.tags_inserted
        );
    }
    Ok(report)
}

/// In-memory connection with the full schema and seed data, for unit tests.
#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    seed_reference_data(&mut conn).unwrap();
    conn
}
