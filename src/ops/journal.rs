//! The asynchronous journal API.

use crate::db::entries::{self, JournalEntry, NewEntry};
use crate::db::moods::{self, EntryMoods, Mood};
use crate::db::search::{self, SearchFilter};
use crate::db::tags::{self, Tag};
use crate::db::users::{self, User};
use crate::db::Database;
use crate::errors::{AppResult, StorageError};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::debug;

/// Handle to an open journal. Cheap to clone; clones share one pool.
///
/// Each call checks out its own pooled connection on a blocking thread and
/// returns it before the future completes. Two mutations issued concurrently
/// are each atomic but run in no guaranteed order.
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use daybook::db::entries::NewEntry;
/// use daybook::ops::Journal;
///
/// # async fn demo() -> daybook::AppResult<()> {
/// let journal = Journal::open("/tmp/daybook.db".into(), 4).await?;
/// let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// let entry = journal.create_entry(NewEntry::new("Hello", "First entry", today)).await?;
/// journal.set_moods(entry.id, 1, vec![]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Journal {
    db: Database,
}

impl Journal {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database file, creating it if needed, and bootstraps the
    /// schema and reference data.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the tables cannot be
    /// created. Seeding failures are logged, not returned.
    pub async fn open(path: PathBuf, pool_size: u32) -> AppResult<Self> {
        tokio::task::spawn_blocking(move || {
            let db = Database::open_with_pool_size(&path, pool_size)?;
            db.initialize_schema()?;
            Ok(Self::new(db))
        })
        .await
        .map_err(StorageError::Task)?
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    {
        debug!("Dispatching {}", op);
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.get_conn()?;
            f(&mut *conn)
        })
        .await
        .map_err(StorageError::Task)?
    }

    // Entry Store

    pub async fn create_entry(&self, entry: NewEntry) -> AppResult<JournalEntry> {
        self.run("create_entry", move |conn| entries::create_entry(conn, &entry))
            .await
    }

    pub async fn update_entry(&self, entry: JournalEntry) -> AppResult<JournalEntry> {
        self.run("update_entry", move |conn| entries::update_entry(conn, &entry))
            .await
    }

    pub async fn delete_entry(&self, entry_id: i64) -> AppResult<bool> {
        self.run("delete_entry", move |conn| entries::delete_entry(conn, entry_id))
            .await
    }

    pub async fn get_entry_by_id(&self, entry_id: i64) -> AppResult<Option<JournalEntry>> {
        self.run("get_entry_by_id", move |conn| {
            entries::get_entry_by_id(conn, entry_id)
        })
        .await
    }

    pub async fn get_entry_by_date(&self, date: NaiveDate) -> AppResult<Option<JournalEntry>> {
        self.run("get_entry_by_date", move |conn| {
            entries::get_entry_by_date(conn, date)
        })
        .await
    }

    pub async fn list_entries(&self) -> AppResult<Vec<JournalEntry>> {
        self.run("list_entries", |conn| entries::list_entries(conn))
            .await
    }

    // Association Manager

    pub async fn set_moods(
        &self,
        entry_id: i64,
        primary_mood_id: i64,
        secondary_mood_ids: Vec<i64>,
    ) -> AppResult<()> {
        self.run("set_moods", move |conn| {
            moods::set_entry_moods(conn, entry_id, primary_mood_id, &secondary_mood_ids)
        })
        .await
    }

    pub async fn get_moods(&self, entry_id: i64) -> AppResult<EntryMoods> {
        self.run("get_moods", move |conn| moods::get_entry_moods(conn, entry_id))
            .await
    }

    pub async fn list_moods(&self) -> AppResult<Vec<Mood>> {
        self.run("list_moods", |conn| moods::list_moods(conn)).await
    }

    pub async fn find_mood_by_name(&self, name: String) -> AppResult<Option<Mood>> {
        self.run("find_mood_by_name", move |conn| {
            moods::find_mood_by_name(conn, &name)
        })
        .await
    }

    pub async fn set_tags(&self, entry_id: i64, tag_ids: Vec<i64>) -> AppResult<()> {
        self.run("set_tags", move |conn| {
            tags::set_entry_tags(conn, entry_id, &tag_ids)
        })
        .await
    }

    pub async fn get_tags(&self, entry_id: i64) -> AppResult<Vec<Tag>> {
        self.run("get_tags", move |conn| tags::get_entry_tags(conn, entry_id))
            .await
    }

    pub async fn create_tag(&self, name: String) -> AppResult<Tag> {
        self.run("create_tag", move |conn| tags::create_tag(conn, &name))
            .await
    }

    pub async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        self.run("list_tags", |conn| tags::list_tags(conn)).await
    }

    pub async fn find_tag_by_name(&self, name: String) -> AppResult<Option<Tag>> {
        self.run("find_tag_by_name", move |conn| {
            tags::find_tag_by_name(conn, &name)
        })
        .await
    }

    // Search Engine

    pub async fn search(&self, filter: SearchFilter) -> AppResult<Vec<JournalEntry>> {
        self.run("search", move |conn| search::search_entries(conn, &filter))
            .await
    }

    // Credential record

    pub async fn save_user(&self, pin_hash: String) -> AppResult<User> {
        self.run("save_user", move |conn| users::save_user(conn, &pin_hash))
            .await
    }

    pub async fn get_user(&self) -> AppResult<Option<User>> {
        self.run("get_user", |conn| users::get_user(conn)).await
    }

    pub async fn clear_users(&self) -> AppResult<bool> {
        self.run("clear_users", |conn| users::clear_users(conn)).await
    }
}
