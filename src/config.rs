//! Configuration for the logger
//!
//! There is no configuration file: hosts build a [`LoggerConfig`] in code, or embed it in
//! their own serde-backed settings.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::Severity;

/// Environment variable read by [`LoggerConfig::from_env`]
pub const LEVEL_ENV_VAR: &str = "DAYLOG_LEVEL";

/// Directory name used by every policy
pub const LOGS_DIR_NAME: &str = "logs";

/// Default file extension for dated log files
pub const DEFAULT_EXTENSION: &str = "log";

/// Where dated log files are placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogDirPolicy {
    /// A fixed directory; relative paths resolve against the working directory
    Fixed { path: PathBuf },
    /// `<exe dir>/logs`, or `<exe dir>/logs/<exe name>` when namespaced
    Executable {
        #[serde(default)]
        namespaced: bool,
    },
    /// `~/.<app>/logs`, falling back to `./.<app>/logs` without a home directory
    Home { app: String },
}

impl Default for LogDirPolicy {
    fn default() -> Self {
        LogDirPolicy::Fixed {
            path: PathBuf::from(LOGS_DIR_NAME),
        }
    }
}

impl LogDirPolicy {
    /// Fixed directory policy
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        LogDirPolicy::Fixed { path: path.into() }
    }

    /// Resolve the directory this policy points at
    ///
    /// Nothing is created. Only the executable policy can fail, when the running
    /// binary cannot be located.
    pub fn resolve(&self) -> io::Result<PathBuf> {
        match self {
            LogDirPolicy::Fixed { path } => Ok(path.clone()),
            LogDirPolicy::Executable { namespaced } => {
                let exe = std::env::current_exe()?;
                let parent = exe.parent().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory")
                })?;
                let dir = parent.join(LOGS_DIR_NAME);
                match exe.file_stem() {
                    Some(stem) if *namespaced => Ok(dir.join(stem)),
                    _ => Ok(dir),
                }
            }
            LogDirPolicy::Home { app } => Ok(try_home_logs_dir(app)
                .unwrap_or_else(|| PathBuf::from(format!(".{}", app)).join(LOGS_DIR_NAME))),
        }
    }
}

/// Try to get `~/.<app>/logs`, returning None if the home dir is unavailable
pub fn try_home_logs_dir(app: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(format!(".{}", app)).join(LOGS_DIR_NAME))
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Initial threshold (default: INFO)
    #[serde(default)]
    pub level: Severity,

    /// Log directory policy (default: `logs` in the working directory)
    #[serde(default)]
    pub log_dir: LogDirPolicy,

    /// Extension of the dated files, without the dot (default: "log")
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::default(),
            log_dir: LogDirPolicy::default(),
            extension: default_extension(),
        }
    }
}

impl LoggerConfig {
    /// Default configuration with the threshold taken from `DAYLOG_LEVEL` when it parses
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(level) = std::env::var(LEVEL_ENV_VAR)
            .ok()
            .and_then(|v| v.parse::<Severity>().ok())
        {
            config.level = level;
        }
        config
    }

    /// Set the initial threshold
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Set the directory policy
    pub fn with_log_dir(mut self, policy: LogDirPolicy) -> Self {
        self.log_dir = policy;
        self
    }

    /// Set the file extension; a leading dot is stripped
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }
}
