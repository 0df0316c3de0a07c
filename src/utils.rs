//! Shared helpers for the CLI and TUI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

/// Format used for due dates on the command line and in the TUI.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/shelf/links.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("shelf").join("links.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` due date as midnight UTC.
pub fn parse_due_date(input: &str) -> Result<OffsetDateTime> {
    let date = Date::parse(input.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", input.trim()))?;
    Ok(date.midnight().assume_utc())
}

/// Formats a timestamp as `YYYY-MM-DD`.
pub fn format_date(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| "????-??-??".to_string())
}
