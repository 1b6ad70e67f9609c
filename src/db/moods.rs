//! Mood reference data and entry mood associations.
//!
//! Each entry that has moods carries exactly one primary mood and at most
//! [`MAX_SECONDARY_MOODS`] secondary moods. The whole set is replaced at once.

use crate::constants::MAX_SECONDARY_MOODS;
use crate::db::begin_write;
use crate::db::entries::entry_exists;
use crate::errors::{AppError, AppResult, StorageError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Mood category. Variants are declared in the order of their stored names,
/// so `Ord` agrees with the listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MoodCategory {
    Negative,
    Neutral,
    Positive,
}

impl MoodCategory {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodCategory::Positive => "Positive",
            MoodCategory::Neutral => "Neutral",
            MoodCategory::Negative => "Negative",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Positive" => Some(MoodCategory::Positive),
            "Neutral" => Some(MoodCategory::Neutral),
            "Negative" => Some(MoodCategory::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mood from the fixed reference set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mood {
    pub id: i64,
    pub name: String,
    pub category: MoodCategory,
}

/// The moods attached to one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryMoods {
    /// `None` if moods were never set for the entry.
    pub primary: Option<Mood>,
    /// In the order they were passed to [`set_entry_moods`].
    pub secondary: Vec<Mood>,
}

fn mood_from_row(row: &Row<'_>) -> rusqlite::Result<Mood> {
    let category: String = row.get(2)?;
    Ok(Mood {
        id: row.get(0)?,
        name: row.get(1)?,
        category: MoodCategory::parse(&category).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown mood category '{}'", category).into(),
            )
        })?,
    })
}

/// Replaces the mood set of an entry.
///
/// Existing links are deleted, then one primary link and one link per
/// secondary id are inserted, all in one transaction. Secondary ids are not
/// deduplicated: each id passed produces its own link.
///
/// # Errors
///
/// Returns:
/// - `AppError::Validation` for more than two secondary ids, a non-positive
///   id, or an id that names no mood
/// - `AppError::NotFound` if the entry does not exist
///
/// On any error the entry keeps its previous moods.
pub fn set_entry_moods(
    conn: &mut Connection,
    entry_id: i64,
    primary_mood_id: i64,
    secondary_mood_ids: &[i64],
) -> AppResult<()> {
    if secondary_mood_ids.len() > MAX_SECONDARY_MOODS {
        return Err(AppError::Validation(format!(
            "At most {} secondary moods are allowed, got {}",
            MAX_SECONDARY_MOODS,
            secondary_mood_ids.len()
        )));
    }
    if let Some(bad) = std::iter::once(&primary_mood_id)
        .chain(secondary_mood_ids)
        .find(|id| **id <= 0)
    {
        return Err(AppError::Validation(format!("Invalid mood id {}", bad)));
    }

    debug!(
        "Setting moods for entry {}: primary {}, secondary {:?}",
        entry_id, primary_mood_id, secondary_mood_ids
    );

    let tx = begin_write(conn)?;

    if !entry_exists(&tx, entry_id)? {
        return Err(AppError::NotFound(format!(
            "Entry with id {} not found",
            entry_id
        )));
    }
    for mood_id in std::iter::once(&primary_mood_id).chain(secondary_mood_ids) {
        if get_mood(&tx, *mood_id)?.is_none() {
            return Err(AppError::Validation(format!("Unknown mood id {}", mood_id)));
        }
    }

    tx.execute("DELETE FROM entry_moods WHERE entry_id = ?1", params![entry_id])
        .map_err(StorageError::Sqlite)?;

    tx.execute(
        "INSERT INTO entry_moods (entry_id, mood_id, is_primary) VALUES (?1, ?2, 1)",
        params![entry_id, primary_mood_id],
    )
    .map_err(StorageError::Sqlite)?;

    {
        let mut insert_secondary = tx
            .prepare("INSERT INTO entry_moods (entry_id, mood_id, is_primary) VALUES (?1, ?2, 0)")
            .map_err(StorageError::Sqlite)?;
        for mood_id in secondary_mood_ids {
            insert_secondary
                .execute(params![entry_id, mood_id])
                .map_err(StorageError::Sqlite)?;
        }
    }

    tx.commit().map_err(StorageError::Sqlite)?;

    info!(
        "Entry {} now has primary mood {} and {} secondary",
        entry_id,
        primary_mood_id,
        secondary_mood_ids.len()
    );
    Ok(())
}

/// Gets the moods attached to an entry.
///
/// An unknown entry, or one whose moods were never set, yields an empty
/// [`EntryMoods`].
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_entry_moods(conn: &Connection, entry_id: i64) -> AppResult<EntryMoods> {
    debug!("Getting moods for entry {}", entry_id);

    let mut stmt = conn
        .prepare(
            r#"
            SELECT m.id, m.name, m.category, em.is_primary
            FROM entry_moods em
            INNER JOIN moods m ON em.mood_id = m.id
            WHERE em.entry_id = ?1
            ORDER BY em.id
            "#,
        )
        .map_err(StorageError::Sqlite)?;

    let rows = stmt
        .query_map(params![entry_id], |row| {
            Ok((mood_from_row(row)?, row.get::<_, bool>(3)?))
        })
        .map_err(StorageError::Sqlite)?;

    let mut moods = EntryMoods::default();
    for row in rows {
        let (mood, is_primary) = row.map_err(StorageError::Sqlite)?;
        if is_primary {
            moods.primary = Some(mood);
        } else {
            moods.secondary.push(mood);
        }
    }

    Ok(moods)
}

/// Lists every mood, grouped by category name (Negative, Neutral, Positive) and
/// sorted by name within a category.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_moods(conn: &Connection) -> AppResult<Vec<Mood>> {
    debug!("Listing moods");

    let mut stmt = conn
        .prepare(
            r#"
            SELECT id, name, category
            FROM moods
            ORDER BY category, name
            "#,
        )
        .map_err(StorageError::Sqlite)?;

    let moods = stmt
        .query_map([], mood_from_row)
        .map_err(StorageError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::Sqlite)?;

    Ok(moods)
}

/// Retrieves a mood by id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_mood(conn: &Connection, mood_id: i64) -> AppResult<Option<Mood>> {
    conn.query_row(
        "SELECT id, name, category FROM moods WHERE id = ?1",
        params![mood_id],
        mood_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}

/// Retrieves a mood by name, ignoring ASCII case.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_mood_by_name(conn: &Connection, name: &str) -> AppResult<Option<Mood>> {
    conn.query_row(
        "SELECT id, name, category FROM moods WHERE name = ?1 COLLATE NOCASE",
        params![name.trim()],
        mood_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}
