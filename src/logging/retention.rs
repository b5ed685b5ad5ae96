//! Log file retention management
//!
//! Removes dated log files whose date is older than the retention period. The date comes
//! from the file name, not the modification time, so a file appended to late is still
//! judged by the day it belongs to.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use super::file_writer::date_from_file_name;
use crate::config::DEFAULT_EXTENSION;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Clean up `.log` files older than the default retention period
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs_default(logs_dir: &Path) -> Result<usize> {
    cleanup_old_logs(logs_dir, DEFAULT_RETENTION_DAYS, DEFAULT_EXTENSION)
}

/// Clean up dated files more than `retention_days` days before today
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path, retention_days: u64, extension: &str) -> Result<usize> {
    let today = Local::now().date_naive();
    let cutoff = today
        .checked_sub_days(chrono::Days::new(retention_days))
        .unwrap_or(NaiveDate::MIN);
    cleanup_logs_before(logs_dir, cutoff, extension)
}

/// Delete dated files whose date is strictly before `cutoff`
///
/// Files whose names are not `YYYY-MM-DD.<extension>` are never touched. A missing
/// directory counts as nothing to do.
pub fn cleanup_logs_before(logs_dir: &Path, cutoff: NaiveDate, extension: &str) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let mut deleted_count = 0;

    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("Failed to read log directory {}", logs_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| date_from_file_name(n, extension))
        else {
            continue;
        };

        if date < cutoff && path.is_file() && fs::remove_file(&path).is_ok() {
            deleted_count += 1;
        }
    }

    Ok(deleted_count)
}
