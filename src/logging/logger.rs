//! The logger
//!
//! A [`Logger`] owns its threshold, its sinks and one mutex guarding all of them. Every
//! accepted message is formatted once and written to the console and, when enabled, to
//! the dated file while the lock is held, so lines from concurrent callers never interleave.
//!
//! Share one instance through `Arc<Logger>`; there is no global.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, NaiveDate};

use super::file_writer::DatedFile;
use super::format::format_line;
use super::level::Severity;
use crate::config::{LogDirPolicy, LoggerConfig, LOGS_DIR_NAME};
use crate::error::{LogError, Result};

/// Source of the current time
type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Everything the lock guards
struct State {
    threshold: Severity,
    console: Box<dyn Write + Send>,
    errors: Box<dyn Write + Send>,
    file: Option<DatedFile>,
    /// Day whose rollover already failed; not retried until the date changes again
    failed_rollover: Option<NaiveDate>,
}

impl State {
    /// Write a line to the console and the file sink
    fn write_line(&mut self, today: NaiveDate, line: &str) {
        self.write_console(line);
        self.write_file(today, line);
    }

    fn write_console(&mut self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        // Console failures have nowhere better to go
        let _ = self.console.write_all(buf.as_bytes());
        let _ = self.console.flush();
    }

    fn write_file(&mut self, today: NaiveDate, line: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        if file.date() != today && self.failed_rollover != Some(today) {
            match file.reopen_for(today) {
                Ok(next) => {
                    *file = next;
                    self.failed_rollover = None;
                }
                Err(e) => {
                    report(&mut self.errors, format_args!("{}", e));
                    self.failed_rollover = Some(today);
                }
            }
        }

        if let Err(e) = file.write_line(line) {
            report(
                &mut self.errors,
                format_args!(
                    "Failed to write log file {}: {}; file logging disabled",
                    file.path().display(),
                    e
                ),
            );
            self.file = None;
        }
    }
}

/// Write one message to the error channel
///
/// Never routed through the log sinks, so a broken sink cannot recurse.
fn report(errors: &mut dyn Write, message: fmt::Arguments<'_>) {
    let _ = writeln!(errors, "daylog: {}", message);
    let _ = errors.flush();
}

/// Leveled logger with a console sink and an optional dated file sink
pub struct Logger {
    state: Mutex<State>,
    log_dir: LogDirPolicy,
    extension: String,
    clock: Clock,
}

impl Logger {
    /// Create a logger writing to stdout, reporting its own failures to stderr
    pub fn new(config: LoggerConfig) -> Self {
        Self::with_sinks(config, io::stdout(), io::stderr())
    }

    /// Create a logger with the default configuration
    pub fn stdout() -> Self {
        Self::new(LoggerConfig::default())
    }

    /// Create a logger with explicit console and error sinks
    pub fn with_sinks(
        config: LoggerConfig,
        console: impl Write + Send + 'static,
        errors: impl Write + Send + 'static,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                threshold: config.level,
                console: Box::new(console),
                errors: Box::new(errors),
                file: None,
                failed_rollover: None,
            }),
            log_dir: config.log_dir,
            extension: config.extension,
            clock: Box::new(Local::now),
        }
    }

    /// Replace the clock used for timestamps and file dates
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // A panic while holding the lock leaves the state consistent; keep logging
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the minimum severity that will be emitted
    pub fn set_level(&self, level: Severity) {
        self.lock().threshold = level;
    }

    /// Current minimum severity
    pub fn level(&self) -> Severity {
        self.lock().threshold
    }

    /// Check whether a message at `level` would currently be emitted
    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.level()
    }

    /// Resolve the configured log directory without creating it
    pub fn log_dir(&self) -> Result<PathBuf> {
        self.log_dir
            .resolve()
            .map_err(|source| LogError::DirectoryCreation {
                path: PathBuf::from(LOGS_DIR_NAME),
                source,
            })
    }

    /// Start (or restart) writing to today's log file
    ///
    /// Creates the log directory if needed and opens `YYYY-MM-DD.<ext>` for appending. A
    /// previously open file is closed only after the new one opened, so a failure leaves the
    /// current file sink in place. Failures are also reported on the error channel.
    ///
    /// On success an INFO confirmation naming the file is logged and the path is returned.
    /// The confirmation goes to the new file before it is installed; if that write fails the
    /// call returns [`LogError::FileOpen`] and the previous sink stays in place.
    pub fn enable_file_logging(&self) -> Result<PathBuf> {
        let mut state = self.lock();
        let now = (self.clock)();
        let threshold = state.threshold;

        let opened = self
            .log_dir()
            .and_then(|dir| DatedFile::open(&dir, now.date_naive(), &self.extension))
            .and_then(|mut file| {
                if Severity::Info < threshold {
                    return Ok((file, None));
                }
                let line = format_line(
                    Severity::Info,
                    &now,
                    &format!("File logging enabled: {}", file.path().display()),
                );
                match file.write_line(&line) {
                    Ok(()) => Ok((file, Some(line))),
                    Err(source) => Err(LogError::FileOpen {
                        path: file.path().to_path_buf(),
                        source,
                    }),
                }
            });
        let (file, confirmation) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                report(&mut state.errors, format_args!("{}", e));
                return Err(e);
            }
        };

        let path = file.path().to_path_buf();
        // Dropping the old handle closes it
        state.file = Some(file);
        state.failed_rollover = None;

        if let Some(line) = confirmation {
            state.write_console(&line);
        }

        Ok(path)
    }

    /// Flush and close the log file; later messages go to the console only
    pub fn close(&self) {
        if let Some(mut file) = self.lock().file.take() {
            let _ = file.sync();
        }
    }

    /// Path of the active log file, if file logging is on
    pub fn file_path(&self) -> Option<PathBuf> {
        self.lock().file.as_ref().map(|f| f.path().to_path_buf())
    }

    /// Check if a log file is currently open
    pub fn is_file_logging(&self) -> bool {
        self.lock().file.is_some()
    }

    /// Log a message at `level`
    pub fn log(&self, level: Severity, message: &str) {
        let mut state = self.lock();
        if level < state.threshold {
            return;
        }

        let now = (self.clock)();
        let line = format_line(level, &now, message);
        state.write_line(now.date_naive(), &line);
    }

    /// Log preformatted arguments at `level`; see the `log_*!` macros
    pub fn log_fmt(&self, level: Severity, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(message) => self.log(level, message),
            // Format outside the lock: a Display impl may log too
            None if self.enabled(level) => self.log(level, &args.to_string()),
            None => {}
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    pub fn debug_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(Severity::Debug, args);
    }

    pub fn info_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(Severity::Info, args);
    }

    pub fn warn_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(Severity::Warn, args);
    }

    pub fn error_fmt(&self, args: fmt::Arguments<'_>) {
        self.log_fmt(Severity::Error, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Logger")
            .field("threshold", &state.threshold)
            .field("file", &state.file.as_ref().map(|file| file.path()))
            .field("log_dir", &self.log_dir)
            .field("extension", &self.extension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::format::parse_line;
    use crate::logging::CaptureSink;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn capture_logger(config: LoggerConfig) -> (Logger, CaptureSink, CaptureSink) {
        let console = CaptureSink::new();
        let errors = CaptureSink::new();
        let logger = Logger::with_sinks(config, console.clone(), errors.clone());
        (logger, console, errors)
    }

    fn dir_config(dir: &Path) -> LoggerConfig {
        LoggerConfig::default().with_log_dir(LogDirPolicy::fixed(dir))
    }

    fn noon(day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    /// Clock starting at noon on 2026-03-01, advanced by the returned counter in days
    fn stepping_clock() -> (Arc<AtomicI64>, impl Fn() -> DateTime<Local> + Send + Sync) {
        let days = Arc::new(AtomicI64::new(0));
        let counter = Arc::clone(&days);
        let clock = move || noon(1) + chrono::Duration::days(counter.load(Ordering::SeqCst));
        (days, clock)
    }

    #[test]
    fn test_default_threshold_scenario() {
        let (logger, console, _) = capture_logger(LoggerConfig::default());

        logger.debug("x");
        assert!(console.is_empty());

        logger.info("y");
        let lines = console.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("INFO ["));
        assert!(lines[0].ends_with("y"));

        logger.set_level(Severity::Debug);
        logger.debug("z");
        let lines = console.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("DEBUG ["));
        assert!(lines[1].ends_with("z"));
    }

    #[test]
    fn test_below_threshold_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, console, errors) = capture_logger(dir_config(temp_dir.path()));
        let path = logger.enable_file_logging().unwrap();
        logger.set_level(Severity::Error);

        console.clear();
        let file_before = fs::read_to_string(&path).unwrap();

        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.log_fmt(Severity::Warn, format_args!("{} {}", "formatted", 1));

        assert!(console.is_empty());
        assert!(errors.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), file_before);
    }

    #[test]
    fn test_one_line_per_call_in_each_sink() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, console, _) = capture_logger(dir_config(temp_dir.path()));
        let path = logger.enable_file_logging().unwrap();
        console.clear();
        let file_before = fs::read_to_string(&path).unwrap().lines().count();

        logger.warn("disk almost full");
        logger.error_fmt(format_args!("code {}", 42));

        let console_lines = console.lines();
        assert_eq!(console_lines.len(), 2);

        let content = fs::read_to_string(&path).unwrap();
        let file_lines: Vec<&str> = content.lines().skip(file_before).collect();
        assert_eq!(file_lines, console_lines);

        let first = parse_line(&console_lines[0]).unwrap();
        assert_eq!(first.level, Severity::Warn);
        assert_eq!(first.message, "disk almost full");
        let second = parse_line(&console_lines[1]).unwrap();
        assert_eq!(second.level, Severity::Error);
        assert_eq!(second.message, "code 42");
    }

    #[test]
    fn test_set_level_is_idempotent() {
        let (logger, console, _) = capture_logger(LoggerConfig::default());

        logger.set_level(Severity::Warn);
        logger.set_level(Severity::Warn);
        assert_eq!(logger.level(), Severity::Warn);
        assert!(!logger.enabled(Severity::Info));
        assert!(logger.enabled(Severity::Warn));

        logger.info("dropped");
        logger.warn("kept");
        assert_eq!(console.lines().len(), 1);
    }

    #[test]
    fn test_enable_creates_dir_and_confirms() {
        let temp_dir = TempDir::new().unwrap();
        let logs = temp_dir.path().join("nested").join("logs");
        let (logger, console, errors) =
            capture_logger(dir_config(&logs).with_level(Severity::Info));
        let logger = logger.with_clock(|| noon(7));

        let path = logger.enable_file_logging().unwrap();

        assert!(logs.is_dir());
        assert_eq!(path, logs.join("2026-03-07.log"));
        assert!(path.exists());
        assert_eq!(logger.file_path(), Some(path.clone()));

        let expected = format!("File logging enabled: {}", path.display());
        let console_lines = console.lines();
        assert_eq!(console_lines.len(), 1);
        assert_eq!(parse_line(&console_lines[0]).unwrap().message, expected);

        let file_content = fs::read_to_string(&path).unwrap();
        assert_eq!(file_content.lines().count(), 1);
        assert!(file_content.contains(&expected));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_enable_confirmation_is_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, console, _) =
            capture_logger(dir_config(temp_dir.path()).with_level(Severity::Error));

        let path = logger.enable_file_logging().unwrap();

        assert!(logger.is_file_logging());
        assert!(console.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_custom_extension() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, _, _) = capture_logger(dir_config(temp_dir.path()).with_extension("txt"));
        let logger = logger.with_clock(|| noon(2));

        let path = logger.enable_file_logging().unwrap();
        assert!(path.ends_with("2026-03-02.txt"));
    }

    #[test]
    fn test_repeated_enable_keeps_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, _, _) = capture_logger(dir_config(temp_dir.path()));
        let logger = logger.with_clock(|| noon(3));

        let first = logger.enable_file_logging().unwrap();
        let second = logger.enable_file_logging().unwrap();
        let third = logger.enable_file_logging().unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);

        logger.info("after");

        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);

        // Appending: every confirmation survives the reopen
        let content = fs::read_to_string(&third).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.contains("File logging enabled"))
                .count(),
            3
        );
    }

    #[test]
    fn test_enable_failure_keeps_console() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"a file where the directory should be").unwrap();
        let (logger, console, errors) = capture_logger(dir_config(&blocker.join("logs")));

        let err = logger.enable_file_logging().unwrap_err();
        assert!(matches!(err, LogError::DirectoryCreation { .. }));
        assert!(!logger.is_file_logging());

        let reported = errors.lines();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].starts_with("daylog: Failed to create log directory"));
        assert!(console.is_empty());

        logger.info("still here");
        assert_eq!(console.lines().len(), 1);
        assert!(console.contents().contains("still here"));
    }

    #[test]
    fn test_failed_reenable_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let (days, clock) = stepping_clock();
        let (logger, _, errors) = capture_logger(dir_config(temp_dir.path()));
        let logger = logger.with_clock(clock);

        let first = logger.enable_file_logging().unwrap();

        // Tomorrow's file name is taken by a directory
        fs::create_dir(temp_dir.path().join("2026-03-02.log")).unwrap();
        days.store(1, Ordering::SeqCst);

        let err = logger.enable_file_logging().unwrap_err();
        assert!(matches!(err, LogError::FileOpen { .. }));
        assert_eq!(logger.file_path(), Some(first.clone()));
        assert_eq!(errors.lines().len(), 1);

        // Rollover fails the same way, is reported once, and writes stay on the old file
        logger.warn("one");
        logger.warn("two");
        assert_eq!(errors.lines().len(), 2);
        let content = fs::read_to_string(&first).unwrap();
        assert!(content.contains("one"));
        assert!(content.contains("two"));
    }

    #[test]
    fn test_day_rollover_switches_files() {
        let temp_dir = TempDir::new().unwrap();
        let (days, clock) = stepping_clock();
        let (logger, _, errors) = capture_logger(dir_config(temp_dir.path()));
        let logger = logger.with_clock(clock);

        let first = logger.enable_file_logging().unwrap();
        logger.info("before midnight");

        days.store(1, Ordering::SeqCst);
        logger.info("after midnight");

        let second = temp_dir.path().join("2026-03-02.log");
        assert_eq!(logger.file_path(), Some(second.clone()));

        let old = fs::read_to_string(&first).unwrap();
        let new = fs::read_to_string(&second).unwrap();
        assert!(old.contains("before midnight"));
        assert!(!old.contains("after midnight"));
        assert_eq!(new.lines().count(), 1);
        assert!(new.contains("after midnight"));
        assert!(errors.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_disables_file_sink() {
        let temp_dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/dev/full", temp_dir.path().join("2026-03-01.log")).unwrap();
        let (logger, console, errors) =
            capture_logger(dir_config(temp_dir.path()).with_level(Severity::Error));
        let logger = logger.with_clock(|| noon(1));

        // Confirmation is filtered, so opening succeeds and the first write is what fails
        logger.enable_file_logging().unwrap();
        assert!(logger.is_file_logging());

        logger.error("first");
        assert!(!logger.is_file_logging());
        let reported = errors.lines();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].starts_with("daylog: Failed to write log file"));
        assert!(reported[0].ends_with("; file logging disabled"));

        logger.error("after");
        let lines = console.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("after"));
        assert_eq!(errors.lines().len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unwritable_file_fails_enable() {
        let temp_dir = TempDir::new().unwrap();
        let (days, clock) = stepping_clock();
        let (logger, console, errors) = capture_logger(dir_config(temp_dir.path()));
        let logger = logger.with_clock(clock);

        let first = logger.enable_file_logging().unwrap();
        console.clear();

        std::os::unix::fs::symlink("/dev/full", temp_dir.path().join("2026-03-02.log")).unwrap();
        days.store(1, Ordering::SeqCst);

        let err = logger.enable_file_logging().unwrap_err();
        assert!(matches!(err, LogError::FileOpen { .. }));
        assert!(err.path().ends_with("2026-03-02.log"));
        assert_eq!(logger.file_path(), Some(first));
        assert!(console.is_empty());

        let reported = errors.lines();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].starts_with("daylog: Failed to open log file"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unwritable_file_fails_first_enable() {
        let temp_dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/dev/full", temp_dir.path().join("2026-03-01.log")).unwrap();
        let (logger, console, errors) = capture_logger(dir_config(temp_dir.path()));
        let logger = logger.with_clock(|| noon(1));

        assert!(logger.enable_file_logging().is_err());
        assert!(!logger.is_file_logging());
        assert_eq!(errors.lines().len(), 1);

        logger.info("after");
        assert_eq!(console.lines().len(), 1);
        assert!(console.contents().contains("after"));
        assert_eq!(errors.lines().len(), 1);
    }

    #[test]
    fn test_close_returns_to_console_only() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, console, _) = capture_logger(dir_config(temp_dir.path()));
        let path = logger.enable_file_logging().unwrap();

        logger.close();
        assert!(!logger.is_file_logging());
        assert_eq!(logger.file_path(), None);

        logger.info("console only");
        assert!(console.contents().contains("console only"));
        assert!(!fs::read_to_string(&path).unwrap().contains("console only"));

        // Closing twice is harmless
        logger.close();
    }

    #[test]
    fn test_concurrent_lines_stay_intact() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;

        let temp_dir = TempDir::new().unwrap();
        let (logger, console, _) = capture_logger(dir_config(temp_dir.path()));
        let logger = Arc::new(logger);
        let path = logger.enable_file_logging().unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let level = Severity::ALL[1 + (i % 3)];
                        logger.log_fmt(
                            level,
                            format_args!("thread {} message {} {}", t, i, "x".repeat(64)),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let file_content = fs::read_to_string(&path).unwrap();
        let console_content = console.contents();
        for content in [&file_content, &console_content] {
            let lines: Vec<&str> = content.lines().collect();
            assert_eq!(lines.len(), THREADS * PER_THREAD + 1);
            for line in lines {
                let parsed = parse_line(line).unwrap_or_else(|| panic!("torn line: {:?}", line));
                assert!(
                    parsed.message.starts_with("File logging enabled")
                        || parsed.message.ends_with(&"x".repeat(64))
                );
            }
        }

        // Per-thread order is preserved within each sink
        for t in 0..THREADS {
            let prefix = format!("thread {} message ", t);
            let seen: Vec<usize> = console_content
                .lines()
                .filter_map(parse_line)
                .filter_map(|p| {
                    p.message
                        .strip_prefix(&prefix)
                        .and_then(|rest| rest.split(' ').next())
                        .and_then(|n| n.parse().ok())
                })
                .collect();
            assert_eq!(seen, (0..PER_THREAD).collect::<Vec<_>>());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_logging_from_tasks() {
        let (logger, console, _) = capture_logger(LoggerConfig::default());
        let logger = Arc::new(logger);

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let logger = Arc::clone(&logger);
                tokio::spawn(async move {
                    for i in 0..25 {
                        logger.info_fmt(format_args!("task {} step {}", n, i));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let lines = console.lines();
        assert_eq!(lines.len(), 16 * 25);
        assert!(lines.iter().all(|l| parse_line(l).is_some()));
    }

    #[test]
    fn test_debug_impl_shows_state() {
        let logger = Logger::with_sinks(LoggerConfig::default(), io::sink(), io::sink());
        let rendered = format!("{:?}", logger);
        assert!(rendered.contains("threshold: Info"));
        assert!(rendered.contains("file: None"));
    }
}
