//! Command-line interface for daybook.
//!
//! Moods and tags are addressed by name; ids never need to be typed except
//! for picking an entry.

use crate::constants::{APP_DESCRIPTION, APP_NAME, DATE_FORMAT_COMPACT, DATE_FORMAT_ISO};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A private daily journal with moods and tags
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, author, version, long_about = None)]
pub struct CliArgs {
    /// Print debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Database file to use instead of DAYBOOK_DB
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write the entry for a day (today by default)
    New {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Day of the entry (YYYY-MM-DD or YYYYMMDD)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Change an existing entry
    Edit {
        /// Entry id
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Move the entry to another day
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show one entry with its moods and tags
    Show {
        /// Day of the entry (today by default)
        #[arg(value_parser = parse_date, conflicts_with = "id")]
        date: Option<NaiveDate>,

        /// Look the entry up by id instead
        #[arg(long)]
        id: Option<i64>,
    },

    /// List all entries, newest first
    List,

    /// Delete an entry and its moods and tags
    Delete {
        /// Entry id
        id: i64,
    },

    /// Set the moods of an entry
    Mood {
        /// Entry id
        id: i64,

        /// Primary mood name
        primary: String,

        /// Secondary mood names (at most two)
        #[arg(short, long = "secondary", value_name = "MOOD")]
        secondary: Vec<String>,
    },

    /// Replace the tags of an entry (no names clears them)
    Tag {
        /// Entry id
        id: i64,

        /// Tag names
        names: Vec<String>,
    },

    /// List the available moods
    Moods,

    /// List the available tags
    Tags,

    /// Create a custom tag
    NewTag {
        name: String,
    },

    /// Search entries
    Search {
        /// Text to look for in titles and content
        #[arg(short, long)]
        text: Option<String>,

        /// Earliest day, inclusive
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Latest day, inclusive
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,

        /// Mood name; repeat to match any of several
        #[arg(short, long = "mood", value_name = "MOOD")]
        moods: Vec<String>,

        /// Tag name; repeat to match any of several
        #[arg(short = 'g', long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Manage the unlock PIN
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    /// Configure a PIN
    Set,
    /// Remove the configured PIN; entries are kept
    Reset,
}

/// Parses a date in `YYYY-MM-DD` or `YYYYMMDD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT_ISO)
        .or_else(|_| NaiveDate::parse_from_str(value, DATE_FORMAT_COMPACT))
        .map_err(|_| {
            format!(
                "Invalid date format: '{}'. Use YYYY-MM-DD or YYYYMMDD",
                value
            )
        })
}
