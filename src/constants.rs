//! Constants used throughout the application.
//!
//! This module contains all constants used in the daybook application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "daybook";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A private daily journal with moods and tags";

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";

// Configuration Keys & Environment Variables
/// Environment variable for the database file location.
pub const ENV_VAR_DAYBOOK_DB: &str = "DAYBOOK_DB";
/// Environment variable selecting the log format (`text` or `json`).
pub const ENV_VAR_DAYBOOK_LOG_FORMAT: &str = "DAYBOOK_LOG_FORMAT";
/// Environment variable for the maximum number of pooled connections.
pub const ENV_VAR_DAYBOOK_POOL_SIZE: &str = "DAYBOOK_POOL_SIZE";
/// Environment variable supplying the PIN non-interactively.
pub const ENV_VAR_DAYBOOK_PIN: &str = "DAYBOOK_PIN";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default database location relative to the home directory.
pub const DEFAULT_DB_SUBPATH: &str = ".local/share/daybook/daybook.db";

// Storage
/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 4;
/// Upper bound accepted for `DAYBOOK_POOL_SIZE`.
pub const MAX_POOL_SIZE: u32 = 16;
/// Milliseconds a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD), also the stored form.
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";

// Journal Rules
/// Maximum number of secondary moods attached to one entry.
pub const MAX_SECONDARY_MOODS: usize = 2;

// Seed Data
/// Fixed mood reference set as (name, category) pairs.
pub const SEED_MOODS: &[(&str, &str)] = &[
    ("Happy", "Positive"),
    ("Excited", "Positive"),
    ("Relaxed", "Positive"),
    ("Grateful", "Positive"),
    ("Confident", "Positive"),
    ("Calm", "Neutral"),
    ("Thoughtful", "Neutral"),
    ("Curious", "Neutral"),
    ("Nostalgic", "Neutral"),
    ("Bored", "Neutral"),
    ("Sad", "Negative"),
    ("Angry", "Negative"),
    ("Stressed", "Negative"),
    ("Lonely", "Negative"),
    ("Anxious", "Negative"),
];

/// Pre-built tags seeded for every journal.
pub const SEED_TAGS: &[&str] = &[
    "Work",
    "Health",
    "Travel",
    "Fitness",
    "Family",
    "Friends",
    "Hobbies",
    "Learning",
    "Goals",
    "Reflection",
];
