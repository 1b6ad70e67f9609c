//! Error handling utilities for the daybook application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! The journal core distinguishes four outcomes a caller has to react to:
//! a rejected write ([`AppError::Conflict`]), malformed input
//! ([`AppError::Validation`]), a missing record ([`AppError::NotFound`]) and a
//! failure of the storage engine itself ([`AppError::Storage`]).

use std::io;
use thiserror::Error;

/// Represents failures of the underlying storage engine.
///
/// Any transaction open when one of these is raised has already been rolled
/// back by the time the error reaches the caller.
///
/// # Examples
///
/// ```
/// use daybook::errors::StorageError;
///
/// let error = StorageError::Corrupt("entry_date 'yesterday' is not a date".to_string());
/// assert!(format!("{}", error).contains("yesterday"));
/// ```
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite database error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("Connection pool error: {0}. Try closing other daybook instances.")]
    Pool(#[from] r2d2::Error),

    /// A background storage task panicked or was cancelled.
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A stored value could not be decoded.
    #[error("Stored data is malformed: {0}")]
    Corrupt(String),
}

/// Represents errors raised around the PIN credential.
///
/// # Examples
///
/// ```
/// use daybook::errors::AuthError;
///
/// let error = AuthError::NotConfigured;
/// assert!(format!("{}", error).contains("No PIN"));
/// ```
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential row exists yet.
    #[error("No PIN has been configured. Run `daybook pin set` first.")]
    NotConfigured,

    /// A credential row already exists; only one is ever stored.
    #[error("A PIN is already configured. Reset it before setting a new one.")]
    AlreadyConfigured,

    /// The candidate PIN did not match the stored hash.
    #[error("Incorrect PIN.")]
    InvalidPin,

    /// The PIN was empty.
    #[error("PIN cannot be empty.")]
    EmptyPin,

    /// The PIN could not be hashed or the stored hash could not be parsed.
    #[error("PIN hashing failed: {0}")]
    Hashing(String),

    /// Reading the PIN from the terminal failed.
    #[error("Failed to read PIN: {0}")]
    Prompt(String),
}

/// Represents all possible errors that can occur in the daybook application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error` trait
/// implementation and formatted error messages.
///
/// # Examples
///
/// Creating a conflict error:
/// ```
/// use daybook::errors::AppError;
///
/// let error = AppError::Conflict("An entry already exists for 2024-01-01".to_string());
/// assert_eq!(format!("{}", error), "Conflict: An entry already exists for 2024-01-01");
/// ```
///
/// Converting from an IO error:
/// ```
/// use daybook::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// The write would violate a uniqueness rule (one entry per day, tag names).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input was rejected before any write was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Errors from the storage engine.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to the PIN credential.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl AppError {
    /// Returns true for errors that leave the store untouched and can be
    /// shown to the user as a rejected operation.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Conflict(_) | AppError::Validation(_) | AppError::NotFound(_)
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Storage(StorageError::Sqlite(err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Storage(StorageError::Pool(err))
    }
}

/// Returns true if `err` is SQLite reporting a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use daybook::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Validation("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;
