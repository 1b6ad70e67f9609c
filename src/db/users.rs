//! The PIN credential record.
//!
//! At most one row ever exists. The hash is produced and checked by a
//! [`PinVerifier`](crate::auth::PinVerifier); this module only stores it.

use crate::db::{format_timestamp, now_utc, timestamp_column};
use crate::errors::{AppResult, AuthError, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use tracing::{debug, info};

/// The stored credential.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub pin_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("pin_hash", &crate::constants::REDACTED_PLACEHOLDER)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Stores the credential row.
///
/// # Errors
///
/// Returns `AuthError::AlreadyConfigured` if a row already exists.
pub fn save_user(conn: &Connection, pin_hash: &str) -> AppResult<User> {
    debug!("Saving PIN credential");

    let created_at = now_utc();
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO users (id, pin_hash, created_at) VALUES (1, ?1, ?2)",
            params![pin_hash, format_timestamp(&created_at)],
        )
        .map_err(StorageError::Sqlite)?;

    if inserted == 0 {
        return Err(AuthError::AlreadyConfigured.into());
    }

    info!("PIN credential stored");
    Ok(User {
        id: 1,
        pin_hash: pin_hash.to_string(),
        created_at,
    })
}

/// Retrieves the credential row, if one exists.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_user(conn: &Connection) -> AppResult<Option<User>> {
    conn.query_row(
        "SELECT id, pin_hash, created_at FROM users LIMIT 1",
        [],
        |row| {
            Ok(User {
                id: row.get(0)?,
                pin_hash: row.get(1)?,
                created_at: timestamp_column(row, 2)?,
            })
        },
    )
    .optional()
    .map_err(|e| StorageError::Sqlite(e).into())
}

/// Removes the credential row. Journal data is left alone.
///
/// Returns whether a row was removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn clear_users(conn: &Connection) -> AppResult<bool> {
    let removed = conn
        .execute("DELETE FROM users", [])
        .map_err(StorageError::Sqlite)?;
    if removed > 0 {
        info!("PIN credential removed");
    }
    Ok(removed > 0)
}
