//! Append-only session log under the config directory.
//!
//! Every call is a no-op until `init_logger` opens a file, so library code and
//! tests stay silent.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.pad(label)
    }
}

lazy_static! {
    static ref SINK: Mutex<Option<File>> = Mutex::new(None);
}

/// Opens `<config dir>/logs/lazyedit_<timestamp>.log` and returns its path.
pub fn init_logger() -> Result<PathBuf> {
    init_in(&crate::config::config_dir().join("logs"))
}

fn init_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let path = dir.join(Local::now().format("lazyedit_%Y%m%d_%H%M%S.log").to_string());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    *SINK
        .lock()
        .map_err(|_| anyhow::anyhow!("Log sink lock is poisoned"))? = Some(file);
    Ok(path)
}

/// One entry per call; continuation lines are indented so every entry still
/// starts with its timestamp.
fn format_entry(at: DateTime<Local>, level: LogLevel, message: &str) -> String {
    let mut entry = format!("{} {:<5} {}", at.format("%Y-%m-%d %H:%M:%S%.3f"), level, message);
    if entry.contains('\n') {
        entry = entry.replace('\n', "\n    ");
    }
    entry.push('\n');
    entry
}

pub fn log(level: LogLevel, message: &str) {
    let Ok(mut guard) = SINK.lock() else {
        return;
    };
    if let Some(file) = guard.as_mut() {
        let entry = format_entry(Local::now(), level, message);
        if file.write_all(entry.as_bytes()).is_ok() {
            let _ = file.flush();
        }
    }
}

pub fn debug(message: &str) {
    log(LogLevel::Debug, message)
}

pub fn info(message: &str) {
    log(LogLevel::Info, message)
}

pub fn warn(message: &str) {
    log(LogLevel::Warning, message)
}

pub fn error(message: &str) {
    log(LogLevel::Error, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entries_are_single_prefixed_lines() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(
            format_entry(at, LogLevel::Info, "Loaded 3 rows"),
            "2024-05-01 09:30:00.000 INFO  Loaded 3 rows\n"
        );
        assert_eq!(
            format_entry(at, LogLevel::Error, "Panic\nat main.rs"),
            "2024-05-01 09:30:00.000 ERROR Panic\n    at main.rs\n"
        );
    }
}
