//! daylog - leveled logging to the console and a per-day log file
//!
//! Build one [`Logger`], share it through `Arc`, and call it from any thread:
//!
//! ```no_run
//! use std::sync::Arc;
//! use daylog::{log_info, Logger, LoggerConfig, Severity};
//!
//! let logger = Arc::new(Logger::new(LoggerConfig::default()));
//! logger.set_level(Severity::Debug);
//! logger.enable_file_logging()?;
//! log_info!(logger, "started with {} workers", 4);
//! # Ok::<(), daylog::LogError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LogDirPolicy, LoggerConfig};
pub use error::LogError;
pub use logging::{CaptureSink, Logger, LoggerLayer, Severity};
