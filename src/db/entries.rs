//! Entry CRUD operations.
//!
//! This module provides functions for creating, reading, updating, and deleting
//! journal entries. At most one entry exists per calendar day; every write that
//! could break that rule checks it inside the same transaction that writes.

use crate::db::{begin_write, date_column, format_date, format_timestamp, now_utc, timestamp_column};
use crate::errors::{is_unique_violation, AppError, AppResult, StorageError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

/// Column list matching [`entry_from_row`].
pub(crate) const ENTRY_COLUMNS: &str = "id, title, content, entry_date, created_at, updated_at";

/// Represents a journal entry in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub id: i64,
    pub title: String,
    /// Markdown source, stored verbatim.
    pub content: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-supplied fields of an entry that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub entry_date: NaiveDate,
}

impl NewEntry {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        entry_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            entry_date,
        }
    }

    /// Builds an entry from a full timestamp; only its calendar date is kept.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use daybook::db::entries::NewEntry;
    ///
    /// let moment = NaiveDate::from_ymd_opt(2024, 5, 1)
    ///     .unwrap()
    ///     .and_hms_opt(23, 59, 0)
    ///     .unwrap();
    /// let entry = NewEntry::at("Late night", "...", moment);
    /// assert_eq!(entry.entry_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    /// ```
    pub fn at(title: impl Into<String>, content: impl Into<String>, moment: NaiveDateTime) -> Self {
        Self::new(title, content, moment.date())
    }
}

pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        entry_date: date_column(row, 3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

fn day_taken(date: NaiveDate) -> AppError {
    AppError::Conflict(format!(
        "An entry already exists for {}. Only one entry per day is allowed.",
        format_date(date)
    ))
}

fn map_write_error(err: rusqlite::Error, date: NaiveDate) -> AppError {
    if is_unique_violation(&err) {
        day_taken(date)
    } else {
        StorageError::Sqlite(err).into()
    }
}

/// Creates a new journal entry.
///
/// Assigns a new id and sets `created_at` and `updated_at` to the current UTC
/// time. Returns the stored entry.
///
/// # Errors
///
/// Returns `AppError::Conflict` if an entry already exists for the same
/// calendar date, or a storage error if the write fails.
pub fn create_entry(conn: &mut Connection, new_entry: &NewEntry) -> AppResult<JournalEntry> {
    debug!("Creating entry for date {}", new_entry.entry_date);

    let tx = begin_write(conn)?;

    if find_id_by_date(&tx, new_entry.entry_date)?.is_some() {
        return Err(day_taken(new_entry.entry_date));
    }

    let now = now_utc();
    let stamp = format_timestamp(&now);
    tx.execute(
        r#"
        INSERT INTO journal_entries (title, content, entry_date, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        "#,
        params![
            new_entry.title,
            new_entry.content,
            format_date(new_entry.entry_date),
            stamp
        ],
    )
    .map_err(|e| map_write_error(e, new_entry.entry_date))?;
    let id = tx.last_insert_rowid();

    tx.commit().map_err(StorageError::Sqlite)?;

    info!("Created entry {} for {}", id, new_entry.entry_date);
    Ok(JournalEntry {
        id,
        title: new_entry.title.clone(),
        content: new_entry.content.clone(),
        entry_date: new_entry.entry_date,
        created_at: now,
        updated_at: now,
    })
}

/// Updates title, content and date of an existing entry.
///
/// `created_at` is kept from the stored row; the timestamps on `entry` are
/// ignored. `updated_at` is refreshed and always moves forward.
///
/// # Errors
///
/// Returns:
/// - `AppError::NotFound` if no entry has `entry.id`
/// - `AppError::Conflict` if the date changed to a day another entry holds
pub fn update_entry(conn: &mut Connection, entry: &JournalEntry) -> AppResult<JournalEntry> {
    debug!("Updating entry {}", entry.id);

    let tx = begin_write(conn)?;

    let stored = fetch_by_id(&tx, entry.id)?
        .ok_or_else(|| AppError::NotFound(format!("Entry with id {} not found", entry.id)))?;

    if stored.entry_date != entry.entry_date {
        if let Some(other) = find_id_by_date(&tx, entry.entry_date)? {
            if other != entry.id {
                return Err(day_taken(entry.entry_date));
            }
        }
    }

    // Strictly later than the stored value even if the clock did not advance
    let now = now_utc();
    let updated_at = if now > stored.updated_at {
        now
    } else {
        stored.updated_at + Duration::microseconds(1)
    };

    tx.execute(
        r#"
        UPDATE journal_entries
        SET title = ?1, content = ?2, entry_date = ?3, updated_at = ?4
        WHERE id = ?5
        "#,
        params![
            entry.title,
            entry.content,
            format_date(entry.entry_date),
            format_timestamp(&updated_at),
            entry.id
        ],
    )
    .map_err(|e| map_write_error(e, entry.entry_date))?;

    tx.commit().map_err(StorageError::Sqlite)?;

    info!("Updated entry {}", entry.id);
    Ok(JournalEntry {
        id: entry.id,
        title: entry.title.clone(),
        content: entry.content.clone(),
        entry_date: entry.entry_date,
        created_at: stored.created_at,
        updated_at,
    })
}

/// Deletes an entry together with its mood and tag associations.
///
/// Returns `false` if no entry had this id.
///
/// # Errors
///
/// Returns a storage error if any of the deletes fail; nothing is removed
/// in that case.
pub fn delete_entry(conn: &mut Connection, entry_id: i64) -> AppResult<bool> {
    debug!("Deleting entry {}", entry_id);

    let tx = begin_write(conn)?;

    tx.execute("DELETE FROM entry_moods WHERE entry_id = ?1", params![entry_id])
        .map_err(StorageError::Sqlite)?;
    tx.execute("DELETE FROM entry_tags WHERE entry_id = ?1", params![entry_id])
        .map_err(StorageError::Sqlite)?;
    let removed = tx
        .execute("DELETE FROM journal_entries WHERE id = ?1", params![entry_id])
        .map_err(StorageError::Sqlite)?;

    tx.commit().map_err(StorageError::Sqlite)?;

    if removed > 0 {
        info!("Deleted entry {}", entry_id);
    } else {
        debug!("No entry with id {} to delete", entry_id);
    }
    Ok(removed > 0)
}

/// Retrieves an entry by id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
/// Returns `Ok(None)` if no entry has the given id.
pub fn get_entry_by_id(conn: &Connection, entry_id: i64) -> AppResult<Option<JournalEntry>> {
    debug!("Getting entry {}", entry_id);
    fetch_by_id(conn, entry_id)
}

/// Retrieves the entry for a calendar date.
///
/// # Errors
///
/// Returns an error if the database operation fails.
/// Returns `Ok(None)` if no entry exists for the given date.
pub fn get_entry_by_date(conn: &Connection, date: NaiveDate) -> AppResult<Option<JournalEntry>> {
    debug!("Getting entry for date {}", date);

    conn.query_row(
        &format!(
            "SELECT {} FROM journal_entries WHERE entry_date = ?1",
            ENTRY_COLUMNS
        ),
        params![format_date(date)],
        entry_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}

/// Lists all entries, most recent date first.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_entries(conn: &Connection) -> AppResult<Vec<JournalEntry>> {
    debug!("Listing all entries");

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM journal_entries ORDER BY entry_date DESC, id DESC",
            ENTRY_COLUMNS
        ))
        .map_err(StorageError::Sqlite)?;

    let entries = stmt
        .query_map([], entry_from_row)
        .map_err(StorageError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::Sqlite)?;

    debug!("Found {} entries", entries.len());
    Ok(entries)
}

/// Returns true if an entry with this id exists.
pub(crate) fn entry_exists(conn: &Connection, entry_id: i64) -> AppResult<bool> {
    conn.query_row(
        "SELECT 1 FROM journal_entries WHERE id = ?1",
        params![entry_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(|e| StorageError::Sqlite(e).into())
}

fn fetch_by_id(conn: &Connection, entry_id: i64) -> AppResult<Option<JournalEntry>> {
    conn.query_row(
        &format!("SELECT {} FROM journal_entries WHERE id = ?1", ENTRY_COLUMNS),
        params![entry_id],
        entry_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}

fn find_id_by_date(conn: &Connection, date: NaiveDate) -> AppResult<Option<i64>> {
    conn.query_row(
        "SELECT id FROM journal_entries WHERE entry_date = ?1",
        params![format_date(date)],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}
