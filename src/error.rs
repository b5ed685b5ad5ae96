//! Error types for the logger

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures of the logger's own file handling
///
/// These are the only fallible operations; writing log lines never returns an error.
#[derive(Debug, Error)]
pub enum LogError {
    /// The log directory could not be resolved or created
    #[error("Failed to create log directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The dated log file could not be opened for appending
    #[error("Failed to open log file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LogError {
    /// Path the failed operation was working on
    pub fn path(&self) -> &Path {
        match self {
            LogError::DirectoryCreation { path, .. } | LogError::FileOpen { path, .. } => {
                path.as_path()
            }
        }
    }

    /// Underlying IO error
    pub fn io_error(&self) -> &io::Error {
        match self {
            LogError::DirectoryCreation { source, .. } | LogError::FileOpen { source, .. } => {
                source
            }
        }
    }
}

/// Result alias for logger operations
pub type Result<T> = std::result::Result<T, LogError>;
