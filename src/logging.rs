/// Structured logging for track analysis
///
/// Provides leveled logging tagged with the component that emitted the
/// message and, where relevant, the track identifier. Supports console
/// output and appending to a log file for batch runs.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Ingest,
    Season,
    Density,
    Category,
    Stats,
    Config,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Ingest => write!(f, "INGEST"),
            Component::Season => write!(f, "SEASON"),
            Component::Density => write!(f, "DENSITY"),
            Component::Category => write!(f, "CATEGORY"),
            Component::Stats => write!(f, "STATS"),
            Component::Config => write!(f, "CONFIG"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means another thread panicked mid-log;
        // the slot itself is still usable.
        let mut slot = LOGGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(logger);
    }

    fn log(&self, level: LogLevel, component: Component, track_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let track_part = track_id.map(|t| format!(" [{}]", t)).unwrap_or_default();
        let log_entry = format_entry(&timestamp.to_string(), level, component, &track_part, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, track_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, track_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn format_entry(
    timestamp: &str,
    level: LogLevel,
    component: Component,
    track_part: &str,
    message: &str,
) -> String {
    format!("{} {} {}{}: {}", timestamp, level, component, track_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, track_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, track_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, track_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, track_id, message);
}

/// Log a warning message
pub fn warn(component: Component, track_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, track_id, message);
}

/// Log an error message
pub fn error(component: Component, track_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, track_id, message);
}

/// Log a debug message
pub fn debug(component: Component, track_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, track_id, message);
}

// ---------------------------------------------------------------------------
// Unit Assumption Logging
// ---------------------------------------------------------------------------

/// Warn that a unit was guessed rather than read from metadata.
///
/// Unit problems never abort a computation; the best-guess conversion
/// proceeds and the caller is told about it here.
pub fn log_unit_assumption(component: Component, quantity: &str, assumed: &str, reason: &str) {
    let message = format!(
        "Caution, {} units assumed to be {} ({})",
        quantity, assumed, reason
    );
    warn(component, None, &message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_entry_format_includes_component_and_track() {
        let entry = format_entry(
            "2024-05-01 13:00:00 UTC",
            LogLevel::Warning,
            Component::Category,
            " [storm-7]",
            "pressure likely in Pa",
        );
        assert_eq!(
            entry,
            "2024-05-01 13:00:00 UTC WARN CATEGORY [storm-7]: pressure likely in Pa"
        );
    }

    #[test]
    fn test_log_level_deserializes_lowercase_and_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let w: Wrapper = toml::from_str("level = \"warn\"").unwrap();
        assert_eq!(w.level, LogLevel::Warning);
        let w: Wrapper = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(w.level, LogLevel::Debug);
    }

    #[test]
    fn test_file_logging_appends_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.log");
        let path_str = path.to_str().unwrap();

        let logger = Logger {
            min_level: LogLevel::Info,
            log_file: Some(path_str.to_string()),
            console_timestamps: false,
        };
        logger.log(LogLevel::Debug, Component::Ingest, None, "filtered out");
        logger.log(LogLevel::Info, Component::Ingest, Some("12"), "loaded 4 points");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("filtered out"), "debug below min level must be dropped");
        assert!(contents.contains("INFO INGEST [12]: loaded 4 points"));
    }
}
