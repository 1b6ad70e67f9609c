//! Tag operations.
//!
//! Tags are either pre-built (seeded) or custom (created by the user). Tag
//! names are unique regardless of case. An entry links to each tag at most once.

use crate::db::begin_write;
use crate::db::entries::entry_exists;
use crate::errors::{is_unique_violation, AppError, AppResult, StorageError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Represents a tag in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub is_pre_built: bool,
}

/// Uniqueness key for a tag name: trimmed and lowercased with Unicode case
/// folding, so `Été` and `été` collide.
pub(crate) fn tag_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        is_pre_built: row.get(2)?,
    })
}

/// Drops non-positive ids and repeated ids, keeping first-seen order.
///
/// ```
/// use daybook::db::tags::normalize_tag_ids;
///
/// assert_eq!(normalize_tag_ids(&[3, 0, 1, 3, -2, 1]), vec![3, 1]);
/// ```
pub fn normalize_tag_ids(tag_ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    tag_ids
        .iter()
        .copied()
        .filter(|id| *id > 0 && seen.insert(*id))
        .collect()
}

/// Replaces the tag set of an entry.
///
/// The ids are normalized with [`normalize_tag_ids`], then existing links are
/// deleted and the new ones inserted in one transaction. An empty list clears
/// the entry's tags.
///
/// # Errors
///
/// Returns:
/// - `AppError::NotFound` if the entry does not exist
/// - `AppError::Validation` if an id names no tag
///
/// On any error the entry keeps its previous tags.
pub fn set_entry_tags(conn: &mut Connection, entry_id: i64, tag_ids: &[i64]) -> AppResult<()> {
    let tag_ids = normalize_tag_ids(tag_ids);
    debug!("Setting tags for entry {}: {:?}", entry_id, tag_ids);

    let tx = begin_write(conn)?;

    if !entry_exists(&tx, entry_id)? {
        return Err(AppError::NotFound(format!(
            "Entry with id {} not found",
            entry_id
        )));
    }
    for tag_id in &tag_ids {
        if get_tag(&tx, *tag_id)?.is_none() {
            return Err(AppError::Validation(format!("Unknown tag id {}", tag_id)));
        }
    }

    tx.execute("DELETE FROM entry_tags WHERE entry_id = ?1", params![entry_id])
        .map_err(StorageError::Sqlite)?;

    {
        let mut insert = tx
            .prepare("INSERT INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2)")
            .map_err(StorageError::Sqlite)?;
        for tag_id in &tag_ids {
            insert
                .execute(params![entry_id, tag_id])
                .map_err(StorageError::Sqlite)?;
        }
    }

    tx.commit().map_err(StorageError::Sqlite)?;

    info!("Entry {} now has {} tags", entry_id, tag_ids.len());
    Ok(())
}

/// Gets the tags attached to an entry, sorted by name.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_entry_tags(conn: &Connection, entry_id: i64) -> AppResult<Vec<Tag>> {
    debug!("Getting tags for entry {}", entry_id);

    let mut stmt = conn
        .prepare(
            r#"
            SELECT t.id, t.name, t.is_pre_built
            FROM entry_tags et
            INNER JOIN tags t ON et.tag_id = t.id
            WHERE et.entry_id = ?1
            ORDER BY t.name
            "#,
        )
        .map_err(StorageError::Sqlite)?;

    let tags = stmt
        .query_map(params![entry_id], tag_from_row)
        .map_err(StorageError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::Sqlite)?;

    Ok(tags)
}

/// Creates a custom tag.
///
/// Surrounding whitespace is trimmed before the name is checked and stored.
///
/// # Errors
///
/// Returns:
/// - `AppError::Validation` if the name is empty or whitespace only
/// - `AppError::Conflict` if a tag with the same name exists, ignoring case
pub fn create_tag(conn: &mut Connection, name: &str) -> AppResult<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be empty".to_string()));
    }

    debug!("Creating tag '{}'", name);

    let tx = begin_write(conn)?;

    if let Some(existing) = find_tag_by_name(&tx, name)? {
        return Err(AppError::Conflict(format!(
            "Tag '{}' already exists",
            existing.name
        )));
    }

    tx.execute(
        "INSERT INTO tags (name, name_key, is_pre_built) VALUES (?1, ?2, 0)",
        params![name, tag_key(name)],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Tag '{}' already exists", name))
        } else {
            StorageError::Sqlite(e).into()
        }
    })?;
    let id = tx.last_insert_rowid();

    tx.commit().map_err(StorageError::Sqlite)?;

    info!("Created tag {} '{}'", id, name);
    Ok(Tag {
        id,
        name: name.to_string(),
        is_pre_built: false,
    })
}

/// Lists every tag: pre-built tags first, then custom tags, each sorted by name.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_tags(conn: &Connection) -> AppResult<Vec<Tag>> {
    debug!("Listing tags");

    let mut stmt = conn
        .prepare("SELECT id, name, is_pre_built FROM tags ORDER BY is_pre_built DESC, name")
        .map_err(StorageError::Sqlite)?;

    let tags = stmt
        .query_map([], tag_from_row)
        .map_err(StorageError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::Sqlite)?;

    Ok(tags)
}

/// Retrieves a tag by id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_tag(conn: &Connection, tag_id: i64) -> AppResult<Option<Tag>> {
    conn.query_row(
        "SELECT id, name, is_pre_built FROM tags WHERE id = ?1",
        params![tag_id],
        tag_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}

/// Retrieves a tag by name, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_tag_by_name(conn: &Connection, name: &str) -> AppResult<Option<Tag>> {
    conn.query_row(
        "SELECT id, name, is_pre_built FROM tags WHERE name_key = ?1",
        params![tag_key(name)],
        tag_from_row,
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}
