/*!
# Daybook

Daybook is a private daily journal. Each calendar day holds at most one
entry; entries carry a primary mood, up to two secondary moods and any
number of tags, and can be searched by text, date range, mood and tag.

## Architecture

- `db`: SQLite storage behind an r2d2 pool (schema, entries, moods, tags, search, credential)
- `ops`: asynchronous API for presentation layers, plus the unlock flow
- `auth`: PIN hashing and the explicit lock state
- `config`: Configuration loading and validation
- `cli`: Command-line interface handling using clap
- `errors`: Error handling infrastructure

## Usage Example

```rust,no_run
use daybook::db::entries::NewEntry;
use daybook::db::search::SearchFilter;
use daybook::{Config, Journal};

#[tokio::main]
async fn main() -> daybook::AppResult<()> {
    let config = Config::load()?;
    let journal = Journal::open(config.db_path.clone(), config.pool_size).await?;

    let today = chrono::Local::now().date_naive();
    let entry = journal
        .create_entry(NewEntry::new("Morning", "Coffee on the balcony", today))
        .await?;
    journal.set_tags(entry.id, vec![1, 2]).await?;

    let hits = journal.search(SearchFilter::new().text("coffee")).await?;
    assert_eq!(hits.len(), 1);
    Ok(())
}
```
*/

/// PIN hashing and session lock state
pub mod auth;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// SQLite persistence
pub mod db;
/// Error types and utilities for error handling
pub mod errors;
/// Asynchronous operations
pub mod ops;

pub use config::Config;
pub use errors::{AppError, AppResult};
pub use ops::{Journal, Unlocker};
