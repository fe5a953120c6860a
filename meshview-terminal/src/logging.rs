/// Logging setup for the terminal viewer
///
/// The viewer owns the terminal while it runs, so events always go to a file:
/// the configured one, or `meshview.log` in the working directory. `RUST_LOG`
/// overrides the configured level.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use meshview_core::config::{LogLevel, LoggingConfig};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILE: &str = "meshview.log";

/// Install the global subscriber and return the log file path. Call once,
/// before the first event.
pub fn init_logger(config: &LoggingConfig) -> anyhow::Result<PathBuf> {
    let path = log_path(config);
    let (directory, file_name) = split_log_path(&path)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .with_writer(appender)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;
    Ok(path)
}

pub fn log_path(config: &LoggingConfig) -> PathBuf {
    config
        .file
        .as_deref()
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from)
}

/// Directory (`.` for a bare name) and file name of a log path.
fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("log path {} has no file name", path.display()))?
        .to_string_lossy()
        .into_owned();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name))
}

/// Parse a `--log-level` flag value.
pub fn parse_level(value: &str) -> Result<LogLevel, String> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(format!("unknown log level `{other}`")),
    }
}
