//! Database and logging configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::Level;

/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "COUNTERS_DB_PATH";

const DB_DIR: &str = "counters";
const DB_FILE: &str = "counters.db";

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    InMemory,
}

/// `PRAGMA journal_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// `PRAGMA synchronous` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronous {
    Off,
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    pub fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

/// SQL logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether executed statements are logged at all.
    pub enabled: bool,
    /// Tracing event level for statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are logged at WARN.
    pub slow_query_threshold: Option<Duration>,
    /// Also log the SQL with params inlined as literals.
    pub inline_params: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_query_threshold: Some(Duration::from_millis(250)),
            inline_params: false,
        }
    }
}

impl LogConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable SQL logging.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Override the tracing event level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Log SQL with params inlined.
    pub fn with_inline_params(mut self, inline: bool) -> Self {
        self.inline_params = inline;
        self
    }
}

/// Configuration for [`Database`](crate::database::Database).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    pub foreign_keys: bool,
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    pub log: LogConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            location: DatabaseLocation::InMemory,
            foreign_keys: true,
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            log: LogConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults (in-memory database).
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a database file.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: DatabaseLocation::File(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Use a private in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Resolve the database file from the environment.
    ///
    /// `COUNTERS_DB_PATH` wins; otherwise `$XDG_DATA_HOME/counters/counters.db`,
    /// then `$HOME/.local/share/counters/counters.db`. Falls back to an
    /// in-memory database when none of them is set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let path = non_empty(DB_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                non_empty("XDG_DATA_HOME").map(|dir| PathBuf::from(dir).join(DB_DIR).join(DB_FILE))
            })
            .or_else(|| {
                non_empty("HOME").map(|home| {
                    PathBuf::from(home)
                        .join(".local")
                        .join("share")
                        .join(DB_DIR)
                        .join(DB_FILE)
                })
            });

        match path {
            Some(path) => Self::file(path),
            None => Self::in_memory(),
        }
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn with_synchronous(mut self, synchronous: Synchronous) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Replace the SQL logging configuration.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}
