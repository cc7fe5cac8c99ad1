//! Logging configuration
//!
//! The binary turns this into a `tracing-subscriber` registry; this crate
//! only owns the settings and the log directory housekeeping.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Log file name prefix
const LOG_FILE_PREFIX: &str = "auralight_";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,
    /// Write to stderr
    pub console_output: bool,
    /// Write to a file in `log_directory`
    pub file_output: bool,
    /// Directory holding log files
    pub log_directory: PathBuf,
    /// Number of log files kept by [`LogConfig::cleanup_old_logs`]
    pub max_files: usize,
    /// Timestamp used to name this run's log file
    #[serde(skip, default = "run_stamp")]
    run_stamp: String,
}

fn run_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            max_files: 10,
            run_stamp: run_stamp(),
        }
    }
}

impl LogConfig {
    /// Parsed level, INFO when the configured string is not a level
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Path of this run's log file
    pub fn current_log_path(&self) -> PathBuf {
        self.log_directory
            .join(format!("{}{}.log", LOG_FILE_PREFIX, self.run_stamp))
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_directory)?;
        }
        Ok(())
    }

    /// Delete the oldest log files so at most `max_files - 1` remain,
    /// leaving room for the file of the current run.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_log_file(path))
            .collect();

        // Names embed a sortable timestamp
        logs.sort();

        let keep = self.max_files.saturating_sub(1);
        let excess = logs.len().saturating_sub(keep);
        for path in logs.iter().take(excess) {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log"))
}
