//! Logging configuration for postrag

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "postrag.log";

/// Filter for `level`, applied to this crate and its dependencies
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},postrag={level}"))
}

/// Initialize logging with configuration.
///
/// `RUST_LOG` wins over the configured level. The returned guard flushes the
/// file writer and must be held until the process exits.
pub fn init_logging_with_config(config: Option<&AppConfig>) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config.map_or_else(|| level_filter("info"), |c| level_filter(&c.logging.level))
    });
    init_with_filter(env_filter)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<WorkerGuard> {
    init_with_filter(level_filter(level))
}

fn init_with_filter(env_filter: EnvFilter) -> Result<WorkerGuard> {
    let logs_dir = Path::new(LOG_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::PostRagError::InvalidConfiguration(format!("logging already initialized: {e}"))
        })?;

    tracing::debug!("Log files will be saved to: {LOG_DIR}/{LOG_FILE_PREFIX}.YYYY-MM-DD");
    Ok(guard)
}
