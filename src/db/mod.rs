//! Database operations for journal entries, moods and tags.
//!
//! This module provides SQLite storage for the journal using connection
//! pooling via r2d2. Every operation checks out its own connection and
//! returns it when the guard drops, including on error paths.
//!
//! # Module Structure
//!
//! - `schema`: Table definitions and reference data seeding
//! - `entries`: Entry CRUD operations (one entry per calendar day)
//! - `moods`: Mood reference data and entry mood associations
//! - `tags`: Tag reference data and entry tag associations
//! - `search`: Filtered entry queries
//! - `users`: The single PIN credential record
//!
//! # Example
//!
//! ```no_run
//! use daybook::db::Database;
//! use std::path::Path;
//!
//! let db = Database::open(Path::new("/tmp/daybook.db"))?;
//! db.initialize_schema()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod entries;
pub mod moods;
pub mod schema;
pub mod search;
pub mod tags;
pub mod users;

use crate::constants::{BUSY_TIMEOUT_MS, DATE_FORMAT_ISO, DEFAULT_POOL_SIZE};
use crate::errors::{AppResult, StorageError};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Type alias for a pooled SQLite connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database handle with connection pooling.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Database {
    /// Opens or creates the journal database with the default pool size.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database file cannot be opened.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        Self::open_with_pool_size(db_path, DEFAULT_POOL_SIZE)
    }

    /// Opens or creates the journal database.
    ///
    /// Missing parent directories are created. The file itself is created by
    /// SQLite on first connection.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the database file
    /// * `pool_size` - Maximum number of pooled connections
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent directory cannot be created
    /// - The database file cannot be opened
    /// - The connection pool cannot be initialized
    pub fn open_with_pool_size(db_path: &Path, pool_size: u32) -> AppResult<Self> {
        debug!("Opening database at: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(StorageError::Pool)?;

        // Fail early on unreadable files rather than on the first query
        let conn = pool.get().map_err(StorageError::Pool)?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(StorageError::Sqlite)?;
        drop(conn);

        info!("Database opened successfully");
        Ok(Database {
            pool,
            path: db_path.to_path_buf(),
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the pool is exhausted.
    pub fn get_conn(&self) -> AppResult<PooledConnection> {
        self.pool.get().map_err(|e| StorageError::Pool(e).into())
    }

    /// Creates tables and seeds reference data.
    ///
    /// Table creation failures are returned. Seeding failures are logged and
    /// swallowed: seeding is idempotent and is retried on the next start.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub fn initialize_schema(&self) -> AppResult<()> {
        let mut conn = self.get_conn()?;
        schema::create_tables(&conn)?;

        match schema::seed_reference_data(&mut conn) {
            Ok(report) => debug!(
                "Seeded {} moods and {} pre-built tags",
                report.moods_inserted, report.tags_inserted
            ),
            Err(e) => warn!("Seeding reference data failed, will retry on next start: {}", e),
        }

        info!("Database schema initialized");
        Ok(())
    }
}

/// Per-connection settings applied whenever the pool hands out a connection.
#[derive(Debug)]
struct ConnectionPragmas;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        // Cascades on EntryMood/EntryTag depend on this
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        Ok(())
    }
}

/// Starts a write transaction that rolls back on drop unless committed.
///
/// `IMMEDIATE` takes the write lock up front so read-then-write checks inside
/// the transaction cannot race another writer.
pub(crate) fn begin_write(conn: &mut Connection) -> AppResult<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| StorageError::Sqlite(e).into())
}

/// Current instant, as stored in timestamp columns.
pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT_ISO).to_string()
}

/// Decodes a stored RFC 3339 timestamp column.
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Decodes a stored `YYYY-MM-DD` date column.
pub(crate) fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT_ISO).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_open_and_connect() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open(&db_path).unwrap();
        let conn = db.get_conn().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("deeper").join("journal.db");

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.path(), db_path.as_path());
        assert!(db_path.exists());
    }

    #[test]
    fn test_pooled_connections_enforce_foreign_keys() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("test.db")).unwrap();

        let enabled: i64 = db
            .get_conn()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("test.db")).unwrap();

        db.initialize_schema().unwrap();
        db.initialize_schema().unwrap();
    }

    #[test]
    fn test_seed_failure_does_not_fail_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("test.db")).unwrap();
        let count = |db: &Database, table: &str| -> i64 {
            db.get_conn()
                .unwrap()
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap()
        };

        {
            let conn = db.get_conn().unwrap();
            schema::create_tables(&conn).unwrap();
            conn.execute_batch(
                r#"
                CREATE TRIGGER fail_mood_seed BEFORE INSERT ON moods
                BEGIN
                    SELECT RAISE(ABORT, 'forced failure');
                END;
                "#,
            )
            .unwrap();
        }

        db.initialize_schema().unwrap();
        assert_eq!(count(&db, "moods"), 0);
        assert_eq!(count(&db, "tags"), 0);

        db.get_conn()
            .unwrap()
            .execute_batch("DROP TRIGGER fail_mood_seed")
            .unwrap();

        db.initialize_schema().unwrap();
        assert_eq!(count(&db, "moods"), 15);
        assert_eq!(count(&db, "tags"), 10);
    }

    #[test]
    fn test_uncommitted_write_rolls_back_on_drop() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();

        {
            let tx = begin_write(&mut conn).unwrap();
            tx.execute("INSERT INTO t VALUES (1)", []).unwrap();
            // dropped without commit
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_timestamp_format_is_sortable_and_precise() {
        let ts = DateTime::parse_from_rfc3339("2024-03-05T10:11:12.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&ts), "2024-03-05T10:11:12.123456789Z");
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            "2024-03-05"
        );
    }
}
