/*!
# Daybook - A Private Daily Journal

This file contains the application flow: it loads configuration, installs
logging, opens the journal, gates access behind the PIN when one is set, and
dispatches the requested command.

## Usage

```text
daybook [OPTIONS] <COMMAND>

Commands:
  new      Write the entry for a day (today by default)
  edit     Change an existing entry
  show     Show one entry with its moods and tags
  list     List all entries, newest first
  delete   Delete an entry and its moods and tags
  mood     Set the moods of an entry
  tag      Replace the tags of an entry
  moods    List the available moods
  tags     List the available tags
  new-tag  Create a custom tag
  search   Search entries
  pin      Manage the unlock PIN

Options:
  -v, --verbose    Print debug logging
      --json       Print results as JSON
      --db <PATH>  Database file to use instead of DAYBOOK_DB
```
*/

use chrono::{Local, NaiveDate};
use clap::Parser;
use daybook::auth::{Argon2PinVerifier, AuthSession};
use daybook::cli::{CliArgs, Commands, PinAction};
use daybook::config::Config;
use daybook::constants::{DEFAULT_LOG_LEVEL, TRACING_ROOT_SPAN_NAME};
use daybook::db::entries::{JournalEntry, NewEntry};
use daybook::db::moods::{EntryMoods, Mood};
use daybook::db::search::SearchFilter;
use daybook::db::tags::Tag;
use daybook::errors::{AppError, AppResult, AuthError};
use daybook::ops::{Journal, Unlocker};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.json_logs(), args.verbose);

    let span = info_span!(TRACING_ROOT_SPAN_NAME, correlation_id = %Uuid::new_v4());
    match run(args, config).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_rejection() {
                warn!(error = %e, "Command rejected");
            } else {
                error!(error = %e, "Command failed");
            }
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Reads the environment, applies `--db`, then validates the result once.
fn load_config(args: &CliArgs) -> AppResult<Config> {
    let mut config = Config::from_env()?;
    if let Some(db) = &args.db {
        config.db_path = Config::expand_path(&db.to_string_lossy())?;
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: CliArgs, config: Config) -> AppResult<()> {
    debug!("Configuration: {:?}", config);

    let journal = Journal::open(config.db_path.clone(), config.pool_size).await?;
    let unlocker = Unlocker::new(
        journal.clone(),
        Arc::new(Argon2PinVerifier),
        AuthSession::new(),
    );

    if let Commands::Pin { action } = args.command {
        return run_pin(&unlocker, action, config.pin.as_deref()).await;
    }

    if unlocker.has_pin().await? {
        let pin = read_pin(config.pin.as_deref(), "PIN: ")?;
        unlocker.unlock(&pin).await?;
    } else {
        unlocker.session().unlock();
    }
    info!("Journal unlocked");

    let out = Output { json: args.json };
    dispatch(&journal, args.command, &out).await
}

async fn run_pin(unlocker: &Unlocker, action: PinAction, env_pin: Option<&str>) -> AppResult<()> {
    match action {
        PinAction::Set => {
            if unlocker.has_pin().await? {
                return Err(AuthError::AlreadyConfigured.into());
            }
            let pin = match env_pin {
                Some(pin) => pin.to_string(),
                None => {
                    let first = read_pin(None, "New PIN: ")?;
                    let second = read_pin(None, "Repeat PIN: ")?;
                    if first != second {
                        return Err(AppError::Validation("PINs do not match".to_string()));
                    }
                    first
                }
            };
            unlocker.setup_pin(&pin).await?;
            println!("PIN set.");
        }
        PinAction::Reset => {
            if unlocker.reset_pin().await? {
                println!("PIN removed. Entries were kept.");
            } else {
                println!("No PIN was configured.");
            }
        }
    }
    Ok(())
}

fn read_pin(env_pin: Option<&str>, prompt: &str) -> AppResult<String> {
    match env_pin {
        Some(pin) => Ok(pin.to_string()),
        None => rpassword::prompt_password(prompt)
            .map_err(|e| AuthError::Prompt(e.to_string()).into()),
    }
}

async fn dispatch(journal: &Journal, command: Commands, out: &Output) -> AppResult<()> {
    match command {
        Commands::New {
            title,
            content,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let entry = journal.create_entry(NewEntry::new(title, content, date)).await?;
            out.entry(&entry, None, None)
        }
        Commands::Edit {
            id,
            title,
            content,
            date,
        } => {
            let mut entry = require_entry(journal.get_entry_by_id(id).await?, id)?;
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(content) = content {
                entry.content = content;
            }
            if let Some(date) = date {
                entry.entry_date = date;
            }
            let entry = journal.update_entry(entry).await?;
            out.entry(&entry, None, None)
        }
        Commands::Show { date, id } => {
            let entry = match id {
                Some(id) => require_entry(journal.get_entry_by_id(id).await?, id)?,
                None => {
                    let date = date.unwrap_or_else(today);
                    journal
                        .get_entry_by_date(date)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("No entry for {}", date)))?
                }
            };
            let moods = journal.get_moods(entry.id).await?;
            let tags = journal.get_tags(entry.id).await?;
            out.entry(&entry, Some(&moods), Some(tags.as_slice()))
        }
        Commands::List => out.entries(&journal.list_entries().await?),
        Commands::Delete { id } => {
            if !journal.delete_entry(id).await? {
                return Err(AppError::NotFound(format!("Entry {} does not exist", id)));
            }
            out.message(&format!("Deleted entry {}.", id))
        }
        Commands::Mood {
            id,
            primary,
            secondary,
        } => {
            let primary = resolve_mood(journal, &primary).await?;
            let mut secondary_ids = Vec::with_capacity(secondary.len());
            for name in &secondary {
                secondary_ids.push(resolve_mood(journal, name).await?.id);
            }
            journal.set_moods(id, primary.id, secondary_ids).await?;
            out.moods_of(&journal.get_moods(id).await?)
        }
        Commands::Tag { id, names } => {
            let mut tag_ids = Vec::with_capacity(names.len());
            for name in &names {
                tag_ids.push(resolve_tag(journal, name).await?.id);
            }
            journal.set_tags(id, tag_ids).await?;
            out.tags(&journal.get_tags(id).await?)
        }
        Commands::Moods => out.moods(&journal.list_moods().await?),
        Commands::Tags => out.tags(&journal.list_tags().await?),
        Commands::NewTag { name } => {
            let tag = journal.create_tag(name).await?;
            out.tags(std::slice::from_ref(&tag))
        }
        Commands::Search {
            text,
            from,
            to,
            moods,
            tags,
        } => {
            let mut filter = SearchFilter::new();
            if let Some(text) = text {
                filter = filter.text(text);
            }
            if let Some(from) = from {
                filter = filter.start_date(from);
            }
            if let Some(to) = to {
                filter = filter.end_date(to);
            }
            let mut mood_ids = Vec::new();
            for name in &moods {
                mood_ids.push(resolve_mood(journal, name).await?.id);
            }
            let mut tag_ids = Vec::new();
            for name in &tags {
                tag_ids.push(resolve_tag(journal, name).await?.id);
            }
            let filter = filter.mood_ids(mood_ids).tag_ids(tag_ids);
            out.entries(&journal.search(filter).await?)
        }
        Commands::Pin { .. } => Ok(()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn require_entry(entry: Option<JournalEntry>, id: i64) -> AppResult<JournalEntry> {
    entry.ok_or_else(|| AppError::NotFound(format!("Entry {} does not exist", id)))
}

async fn resolve_mood(journal: &Journal, name: &str) -> AppResult<Mood> {
    journal
        .find_mood_by_name(name.to_string())
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown mood '{}'", name)))
}

async fn resolve_tag(journal: &Journal, name: &str) -> AppResult<Tag> {
    journal
        .find_tag_by_name(name.to_string())
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown tag '{}'", name)))
}

/// Renders results as text or JSON on stdout.
struct Output {
    json: bool,
}

#[derive(Serialize)]
struct EntryView<'a> {
    #[serde(flatten)]
    entry: &'a JournalEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    moods: Option<&'a EntryMoods>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [Tag]>,
}

impl Output {
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> AppResult<()> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        println!("{}", rendered);
        Ok(())
    }

    fn message(&self, text: &str) -> AppResult<()> {
        if self.json {
            return self.print_json(&serde_json::json!({ "message": text }));
        }
        println!("{}", text);
        Ok(())
    }

    fn entry(
        &self,
        entry: &JournalEntry,
        moods: Option<&EntryMoods>,
        tags: Option<&[Tag]>,
    ) -> AppResult<()> {
        if self.json {
            return self.print_json(&EntryView { entry, moods, tags });
        }
        println!("#{} {} {}", entry.id, entry.entry_date, entry.title);
        if let Some(moods) = moods {
            if let Some(line) = mood_line(moods) {
                println!("Moods: {}", line);
            }
        }
        if let Some(tags) = tags {
            if !tags.is_empty() {
                let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
                println!("Tags: {}", names.join(", "));
            }
        }
        println!();
        println!("{}", entry.content);
        Ok(())
    }

    fn entries(&self, entries: &[JournalEntry]) -> AppResult<()> {
        if self.json {
            return self.print_json(entries);
        }
        if entries.is_empty() {
            println!("No entries.");
        }
        for entry in entries {
            println!("#{} {} {}", entry.id, entry.entry_date, entry.title);
        }
        Ok(())
    }

    fn moods_of(&self, moods: &EntryMoods) -> AppResult<()> {
        if self.json {
            return self.print_json(moods);
        }
        println!("Moods: {}", mood_line(moods).unwrap_or_default());
        Ok(())
    }

    fn moods(&self, moods: &[Mood]) -> AppResult<()> {
        if self.json {
            return self.print_json(moods);
        }
        for mood in moods {
            println!("{:<10} {}", mood.category.as_str(), mood.name);
        }
        Ok(())
    }

    fn tags(&self, tags: &[Tag]) -> AppResult<()> {
        if self.json {
            return self.print_json(tags);
        }
        if tags.is_empty() {
            println!("No tags.");
        }
        for tag in tags {
            let kind = if tag.is_pre_built { "built-in" } else { "custom" };
            println!("{:<10} {}", kind, tag.name);
        }
        Ok(())
    }
}

fn mood_line(moods: &EntryMoods) -> Option<String> {
    let primary = moods.primary.as_ref()?;
    let mut line = primary.name.clone();
    if !moods.secondary.is_empty() {
        let names: Vec<&str> = moods.secondary.iter().map(|m| m.name.as_str()).collect();
        line.push_str(&format!(" (also {})", names.join(", ")));
    }
    Some(line)
}
