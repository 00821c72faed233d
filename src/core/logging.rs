//! Logging backend
//!
//! Everything in the crate logs through the `log` facade. The binary installs
//! a flexi_logger backend here, in one of three line formats:
//!
//! - `text`: timestamp, level tag and message
//! - `ext`: as `text`, followed by the emitting module as a path with line number
//! - `json`: one compact JSON object per line
//!
//! Library users are free to install any other `log` backend instead.

use flexi_logger::{DeferredNow, FileSpec, FlexiLoggerError, FormatFunction, Logger, LoggerHandle};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Keeps the backend alive (and file output flushed) for the life of the process
static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Ext,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log specification: {0}")]
    Backend(#[from] FlexiLoggerError),
}

impl crate::core::error_handling::ContextualError for LoggingError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some("Invalid log level or log file")
    }
}

/// Install the global logger
///
/// `level` is a flexi_logger spec such as `info` or `warn,reactive::producer=trace`.
/// Only the first successful call installs a logger; later calls fail.
pub fn init_logging(
    level: &str,
    format: LogFormat,
    file: Option<&Path>,
    color: bool,
) -> Result<(), LoggingError> {
    let formatter: FormatFunction = match (format, color) {
        (LogFormat::Json, _) => json_format,
        (LogFormat::Ext, true) => ext_color_format,
        (LogFormat::Ext, false) => ext_format,
        (LogFormat::Text, true) => text_color_format,
        (LogFormat::Text, false) => text_format,
    };
    let mut logger = Logger::try_with_str(level)?.format(formatter);

    if let Some(path) = file {
        logger = logger.log_to_file(FileSpec::try_from(path)?);
    }

    let handle = logger.start()?;
    if LOGGER_HANDLE.set(Mutex::new(handle)).is_err() {
        log::debug!("Logger handle already held; keeping the first");
    }
    Ok(())
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn colored_level_tag(level: log::Level) -> colored::ColoredString {
    use colored::Colorize;

    let tag = level_tag(level);
    match level {
        log::Level::Error => tag.red().bold(),
        log::Level::Warn => tag.yellow(),
        log::Level::Info => tag.green(),
        log::Level::Debug => tag.blue(),
        log::Level::Trace => tag.magenta(),
    }
}

fn text_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format(TIMESTAMP_FORMAT),
        level_tag(record.level()),
        record.args()
    )
}

fn text_color_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {}",
        now.format(TIMESTAMP_FORMAT).to_string().dimmed(),
        colored_level_tag(record.level()),
        record.args()
    )
}

fn ext_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format(TIMESTAMP_FORMAT),
        level_tag(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn ext_color_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {} ({})",
        now.format(TIMESTAMP_FORMAT).to_string().dimmed(),
        colored_level_tag(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let line = serde_json::json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_tag(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line()),
    });

    match serde_json::to_string(&line) {
        Ok(json) => w.write_all(json.as_bytes()),
        Err(_) => w.write_all(br#"{"error":"unserializable log record"}"#),
    }
}

/// `reactive::producer::serial` at line 42 becomes `producer/serial.rs:42`
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path = match target.strip_prefix("reactive::") {
        Some(module) => module.replace("::", "/") + ".rs",
        None => target.replace("::", "/"),
    };

    match line {
        Some(line) => format!("{}:{}", path, line),
        None => path,
    }
}
