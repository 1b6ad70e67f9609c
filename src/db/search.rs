//! Filtered queries over journal entries.
//!
//! A [`SearchFilter`] combines up to five independent dimensions. Dimensions
//! are joined with AND; ids within one dimension are joined with OR. Every
//! caller-supplied value, including each id in a list, is bound as a query
//! parameter, never spliced into the SQL text.

use crate::db::entries::{entry_from_row, JournalEntry, ENTRY_COLUMNS};
use crate::db::format_date;
use crate::errors::{AppResult, StorageError};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

/// Search criteria. The default filter matches every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring of the title or the content.
    pub text: Option<String>,
    /// Earliest entry date, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    pub end_date: Option<NaiveDate>,
    /// Entry must carry at least one of these moods, primary or secondary.
    pub mood_ids: Vec<i64>,
    /// Entry must carry at least one of these tags.
    pub tag_ids: Vec<i64>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn mood_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.mood_ids = ids.into_iter().collect();
        self
    }

    pub fn tag_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.tag_ids = ids.into_iter().collect();
        self
    }

    /// Text filter, unless blank.
    fn text_term(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Escapes LIKE wildcards so the text matches literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Builds the SQL text and its bound values for a filter.
fn build_query(filter: &SearchFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(text) = filter.text_term() {
        conditions.push(
            "(e.title LIKE ? ESCAPE '\\' OR e.content LIKE ? ESCAPE '\\')".to_string(),
        );
        let pattern = like_pattern(text);
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    if let Some(start) = filter.start_date {
        conditions.push("e.entry_date >= ?".to_string());
        values.push(Value::Text(format_date(start)));
    }

    if let Some(end) = filter.end_date {
        conditions.push("e.entry_date <= ?".to_string());
        values.push(Value::Text(format_date(end)));
    }

    // EXISTS rather than JOIN: an entry matching several ids is returned once
    if !filter.mood_ids.is_empty() {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM entry_moods em WHERE em.entry_id = e.id AND em.mood_id IN ({}))",
            placeholders(filter.mood_ids.len())
        ));
        values.extend(filter.mood_ids.iter().map(|id| Value::Integer(*id)));
    }

    if !filter.tag_ids.is_empty() {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM entry_tags et WHERE et.entry_id = e.id AND et.tag_id IN ({}))",
            placeholders(filter.tag_ids.len())
        ));
        values.extend(filter.tag_ids.iter().map(|id| Value::Integer(*id)));
    }

    let columns = ENTRY_COLUMNS
        .split(", ")
        .map(|c| format!("e.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("SELECT {} FROM journal_entries e", columns);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY e.entry_date DESC, e.id DESC");

    (sql, values)
}

/// Returns the entries matching `filter`, most recent date first.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn search_entries(conn: &Connection, filter: &SearchFilter) -> AppResult<Vec<JournalEntry>> {
    let (sql, values) = build_query(filter);
    debug!("Executing search: {} ({} bound values)", sql, values.len());

    let mut stmt = conn.prepare(&sql).map_err(StorageError::Sqlite)?;
    let entries = stmt
        .query_map(params_from_iter(values.iter()), entry_from_row)
        .map_err(StorageError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::Sqlite)?;

    debug!("Search matched {} entries", entries.len());
    Ok(entries)
}
