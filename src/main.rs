use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use daylog::logging::{self, Severity};
use daylog::{log_info, Logger, LoggerConfig, LoggerLayer};

/// Usage: `daylog [LEVEL] [MESSAGE...]`
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1).peekable();

    // Threshold from the first argument if it names a level, else DAYLOG_LEVEL, else INFO
    let mut config = LoggerConfig::from_env();
    if let Some(level) = args.peek().and_then(|a| a.parse::<Severity>().ok()) {
        config.level = level;
        args.next();
    }
    let message = args.collect::<Vec<_>>().join(" ");
    let extension = config.extension.clone();

    let logger = Arc::new(Logger::new(config));

    // Route tracing events through the same sinks
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "daylog=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(LoggerLayer::new(Arc::clone(&logger)))
        .init();

    // A file failure has already been reported on stderr; carry on with the console
    match logger.enable_file_logging() {
        Ok(path) => {
            if let Some(dir) = path.parent() {
                match logging::cleanup_old_logs(dir, logging::DEFAULT_RETENTION_DAYS, &extension) {
                    Ok(count) if count > 0 => {
                        tracing::info!("Cleaned up {} old log files", count);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Log cleanup failed: {:#}", e),
                }
            }
        }
        Err(_) => tracing::warn!("Continuing with console logging only"),
    }

    tracing::debug!("Threshold is {}", logger.level());

    if message.is_empty() {
        log_info!(logger, "daylog {} started", env!("CARGO_PKG_VERSION"));
    } else {
        logger.info(&message);
    }

    logger.close();
    Ok(())
}
