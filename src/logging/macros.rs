//! Formatted logging macros
//!
//! Each takes a logger (anything that derefs to [`Logger`](crate::Logger)) followed by
//! `format!`-style arguments. Nothing is formatted when the level is filtered out.

/// Log at an explicit level: `log_at!(logger, Severity::Warn, "retry {}", n)`
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_fmt($level, ::std::format_args!($($arg)+))
    };
}

/// Log at DEBUG
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

/// Log at INFO
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log at WARN
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Warn, $($arg)+)
    };
}

/// Log at ERROR
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Severity::Error, $($arg)+)
    };
}
