//! Logging system for daylog
//!
//! Provides the leveled [`Logger`], its line format, dated log files with retention, an
//! in-memory sink for tests, and a bridge from `tracing`.

mod capture;
pub mod file_writer;
pub mod format;
mod level;
mod logger;
mod macros;
mod retention;
mod tracing_layer;

pub use capture::CaptureSink;
pub use format::{format_line, parse_line, ParsedLine};
pub use level::{ParseSeverityError, Severity, UNKNOWN_LABEL};
pub use logger::Logger;
pub use retention::{
    cleanup_logs_before, cleanup_old_logs, cleanup_old_logs_default, DEFAULT_RETENTION_DAYS,
};
pub use tracing_layer::LoggerLayer;
