//! Configuration management for daybook.
//!
//! Settings come from environment variables with sensible defaults. Paths
//! are expanded with `shellexpand`, so `~` and `$VAR` references work.
//!
//! # Environment Variables
//!
//! - `DAYBOOK_DB`: Path to the database file (defaults to `~/.local/share/daybook/daybook.db`)
//! - `DAYBOOK_LOG_FORMAT`: `text` (default) or `json`
//! - `DAYBOOK_POOL_SIZE`: Maximum pooled connections, 1 to 16 (defaults to 4)
//! - `DAYBOOK_PIN`: PIN used to unlock without prompting
//! - `HOME`: Used for the default database path

use crate::constants::{
    DEFAULT_DB_SUBPATH, DEFAULT_POOL_SIZE, ENV_VAR_DAYBOOK_DB, ENV_VAR_DAYBOOK_LOG_FORMAT,
    ENV_VAR_DAYBOOK_PIN, ENV_VAR_DAYBOOK_POOL_SIZE, ENV_VAR_HOME, LOG_FORMAT_JSON,
    LOG_FORMAT_TEXT, MAX_POOL_SIZE, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Configuration for the daybook application.
///
/// # Examples
///
/// ```
/// use daybook::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("/var/lib/daybook/journal.db"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Location of the SQLite database file.
    pub db_path: PathBuf,

    /// Log output format, `text` or `json`.
    pub log_format: String,

    /// Maximum number of pooled connections.
    pub pool_size: u32,

    /// PIN supplied through the environment, if any.
    pub pin: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &REDACTED_PLACEHOLDER)
            .field("log_format", &self.log_format)
            .field("pool_size", &self.pool_size)
            .field("pin", &self.pin.as_ref().map(|_| REDACTED_PLACEHOLDER))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::new(),
            log_format: LOG_FORMAT_TEXT.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            pin: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables and validates it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if [`Config::from_env`] or
    /// [`Config::validate`] fails.
    pub fn load() -> AppResult<Self> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from environment variables without validating
    /// it, so command-line overrides can be applied first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the database path expansion fails or
    /// `DAYBOOK_POOL_SIZE` is not a number.
    pub fn from_env() -> AppResult<Self> {
        let db_path_raw = env::var(ENV_VAR_DAYBOOK_DB).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DB_SUBPATH)
        });
        let db_path = Self::expand_path(&db_path_raw)?;

        let log_format = env::var(ENV_VAR_DAYBOOK_LOG_FORMAT)
            .map(|value| value.trim().to_lowercase())
            .unwrap_or_else(|_| LOG_FORMAT_TEXT.to_string());

        let pool_size = match env::var(ENV_VAR_DAYBOOK_POOL_SIZE) {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a whole number, got '{}'",
                    ENV_VAR_DAYBOOK_POOL_SIZE, raw
                ))
            })?,
            Err(_) => DEFAULT_POOL_SIZE,
        };

        let pin = env::var(ENV_VAR_DAYBOOK_PIN).ok().filter(|p| !p.is_empty());

        Ok(Config {
            db_path,
            log_format,
            pool_size,
            pin,
        })
    }

    /// Expands `~` and environment variable references in a path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a referenced variable is undefined.
    pub fn expand_path(raw: &str) -> AppResult<PathBuf> {
        let expanded = shellexpand::full(raw)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }

    /// Returns true if logs should be emitted as JSON.
    pub fn json_logs(&self) -> bool {
        self.log_format == LOG_FORMAT_JSON
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the database path is empty or relative,
    /// the log format is unknown, or the pool size is out of range.
    pub fn validate(&self) -> AppResult<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("Database path is empty".to_string()));
        }

        if !self.db_path.is_absolute() {
            return Err(AppError::Config(
                "Database path must be an absolute path".to_string(),
            ));
        }

        if self.log_format != LOG_FORMAT_TEXT && self.log_format != LOG_FORMAT_JSON {
            return Err(AppError::Config(format!(
                "Unknown log format '{}'. Use '{}' or '{}'",
                self.log_format, LOG_FORMAT_TEXT, LOG_FORMAT_JSON
            )));
        }

        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(AppError::Config(format!(
                "Pool size must be between 1 and {}, got {}",
                MAX_POOL_SIZE, self.pool_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        ENV_VAR_DAYBOOK_DB,
        ENV_VAR_DAYBOOK_LOG_FORMAT,
        ENV_VAR_DAYBOOK_POOL_SIZE,
        ENV_VAR_DAYBOOK_PIN,
    ];

    // Clears the daybook variables and restores their values on drop.
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let saved = VARS.iter().map(|&k| (k, env::var(k).ok())).collect();
            for k in VARS {
                env::remove_var(k);
            }
            EnvGuard { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (k, v) in &self.saved {
                match v {
                    Some(v) => env::set_var(k, v),
                    None => env::remove_var(k),
                }
            }
        }
    }

    fn valid_config() -> Config {
        Config {
            db_path: PathBuf::from("/srv/daybook/journal.db"),
            ..Config::default()
        }
    }

    #[test]
    fn test_debug_impl_redacts_sensitive_info() {
        let config = Config {
            db_path: PathBuf::from("/home/username/private/journal.db"),
            pin: Some("4321".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains(REDACTED_PLACEHOLDER));
        assert!(!debug_output.contains("/home/username/private"));
        assert!(!debug_output.contains("4321"));
    }

    #[test]
    #[serial]
    fn test_load_defaults_to_home() {
        let _guard = EnvGuard::new();
        let home = env::var(ENV_VAR_HOME).ok();
        env::set_var(ENV_VAR_HOME, "/home/tester");

        let config = Config::load();

        match home {
            Some(h) => env::set_var(ENV_VAR_HOME, h),
            None => env::remove_var(ENV_VAR_HOME),
        }

        let config = config.unwrap();
        assert_eq!(
            config.db_path,
            PathBuf::from("/home/tester/.local/share/daybook/daybook.db")
        );
        assert_eq!(config.log_format, LOG_FORMAT_TEXT);
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert!(config.pin.is_none());
    }

    #[test]
    #[serial]
    fn test_load_reads_overrides() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_DB, "/tmp/custom/daybook.db");
        env::set_var(ENV_VAR_DAYBOOK_LOG_FORMAT, "JSON");
        env::set_var(ENV_VAR_DAYBOOK_POOL_SIZE, "8");
        env::set_var(ENV_VAR_DAYBOOK_PIN, "2468");

        let config = Config::load().unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom/daybook.db"));
        assert!(config.json_logs());
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.pin.as_deref(), Some("2468"));
    }

    #[test]
    #[serial]
    fn test_load_rejects_bad_pool_size() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_DB, "/tmp/daybook.db");

        env::set_var(ENV_VAR_DAYBOOK_POOL_SIZE, "many");
        assert!(matches!(
            Config::load(),
            Err(AppError::Config(msg)) if msg.contains("whole number")
        ));

        env::set_var(ENV_VAR_DAYBOOK_POOL_SIZE, "64");
        assert!(matches!(
            Config::load(),
            Err(AppError::Config(msg)) if msg.contains("between 1 and 16")
        ));
    }

    #[test]
    #[serial]
    fn test_load_rejects_relative_path() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_DB, "relative/daybook.db");

        match Config::load() {
            Err(AppError::Config(message)) => assert!(message.contains("absolute")),
            other => panic!("Expected Config error about relative path, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defers_validation() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_DB, "relative.db");

        let mut config = Config::from_env().unwrap();
        assert_eq!(config.db_path, PathBuf::from("relative.db"));
        assert!(config.validate().is_err());

        config.db_path = PathBuf::from("/tmp/override.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_empty_pin_is_ignored() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_DB, "/tmp/daybook.db");
        env::set_var(ENV_VAR_DAYBOOK_PIN, "");

        assert!(Config::load().unwrap().pin.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_path() {
        let config = Config::default();
        match config.validate() {
            Err(AppError::Config(message)) => assert!(message.contains("Database path is empty")),
            _ => panic!("Expected Config error about empty path"),
        }
    }

    #[test]
    fn test_validate_unknown_log_format() {
        let config = Config {
            log_format: "yaml".to_string(),
            ..valid_config()
        };
        match config.validate() {
            Err(AppError::Config(message)) => assert!(message.contains("Unknown log format")),
            _ => panic!("Expected Config error about log format"),
        }
    }

    #[test]
    fn test_validate_zero_pool_size() {
        let config = Config {
            pool_size: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_expand_path_handles_env_vars() {
        let _guard = EnvGuard::new();
        env::set_var(ENV_VAR_DAYBOOK_PIN, "x");
        assert_eq!(
            Config::expand_path("/data/$DAYBOOK_PIN/db").unwrap(),
            PathBuf::from("/data/x/db")
        );
        assert!(Config::expand_path("/data/$DAYBOOK_UNSET_FOR_TEST/db").is_err());
    }
}
