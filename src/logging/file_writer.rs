//! Dated log files
//!
//! One file per calendar day, named `YYYY-MM-DD.<ext>`, always opened for appending so a
//! restart never truncates the day's history.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{LogError, Result};

/// `chrono` format for the date part of file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name for a given day
pub fn dated_file_name(date: NaiveDate, extension: &str) -> String {
    format!("{}.{}", date.format(DATE_FORMAT), extension)
}

/// Full path of the file for a given day
pub fn create_log_file_path(logs_dir: &Path, date: NaiveDate, extension: &str) -> PathBuf {
    logs_dir.join(dated_file_name(date, extension))
}

/// Date encoded in a file name, if it is a dated log file with this extension
pub fn date_from_file_name(name: &str, extension: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    // Exactly YYYY-MM-DD; chrono alone would accept unpadded fields
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// Create the logs directory and any missing parents
pub fn ensure_log_dir(logs_dir: &Path) -> Result<()> {
    fs::create_dir_all(logs_dir).map_err(|source| LogError::DirectoryCreation {
        path: logs_dir.to_path_buf(),
        source,
    })
}

/// Open (creating if needed) a file for appending
pub fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// An open dated log file
#[derive(Debug)]
pub struct DatedFile {
    dir: PathBuf,
    extension: String,
    date: NaiveDate,
    path: PathBuf,
    file: File,
}

impl DatedFile {
    /// Create the directory if needed and open the file for `date`
    pub fn open(dir: &Path, date: NaiveDate, extension: &str) -> Result<Self> {
        ensure_log_dir(dir)?;
        let path = create_log_file_path(dir, date, extension);
        let file = open_append(&path)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
            date,
            path,
            file,
        })
    }

    /// Open the file for another day in the same directory
    pub fn reopen_for(&self, date: NaiveDate) -> Result<Self> {
        Self::open(&self.dir, date, &self.extension)
    }

    /// Path of the open file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Day this file belongs to
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Append one line and flush it
    ///
    /// Line and newline go out in a single `write_all` so other appenders to the same
    /// file cannot land between them.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.file.write_all(buf.as_bytes())?;
        self.file.flush()
    }

    /// Flush and sync the file to disk
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}
