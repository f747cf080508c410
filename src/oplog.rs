//! Operator-facing log channel.
//!
//! Background failures (refresh timeouts, undeliverable activity records,
//! failed probes) are never shown to the user. They are appended here as
//! timestamped lines in `~/.healthsync/client.log`, optionally echoed to
//! stderr with a `[healthsync]` prefix. All I/O is best-effort.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;

use crate::config::schema::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Destination for operator diagnostics. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct OperatorLog {
    path: Option<PathBuf>,
    stderr: bool,
}

impl OperatorLog {
    /// Build from the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let path = if config.file.is_empty() {
            default_log_path()
        } else {
            Some(PathBuf::from(&config.file))
        };
        Self {
            path,
            stderr: config.stderr,
        }
    }

    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Log to a specific file only.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            stderr: false,
        }
    }

    pub fn info(&self, message: &str) {
        self.write(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.write(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.write(Level::Error, message);
    }

    fn write(&self, level: Level, message: &str) {
        if self.stderr {
            eprintln!("[healthsync] {} {message}", level.as_str());
        }

        let Some(path) = self.path.as_ref() else {
            return;
        };

        if let Some(parent) = path.parent()
            && create_dir_all(parent).is_err()
        {
            return;
        }

        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };

        let _ = writeln!(
            file,
            "{} {} {}",
            Utc::now().to_rfc3339(),
            level.as_str(),
            message
        );
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".healthsync").join("client.log"))
}
