//! flexi_logger format functions
//!
//! Caller and filename annotations are chosen once at setup, so each
//! combination is its own monomorphised function.

use crate::logging::LogFormat;
use colored::Colorize;
use flexi_logger::{DeferredNow, FormatFunction};
use log::{Level, Record};
use std::io::Write;

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.3f";
const JSON_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn level_abbr(level: Level) -> &'static str {
    match level {
        Level::Error => "ERR",
        Level::Warn => "WRN",
        Level::Info => "INF",
        Level::Debug => "DBG",
        Level::Trace => "TRC",
    }
}

fn colored_level(level: Level) -> colored::ColoredString {
    let abbr = level_abbr(level);
    match level {
        Level::Error => abbr.red().bold(),
        Level::Warn => abbr.yellow(),
        Level::Info => abbr.green(),
        Level::Debug => abbr.blue(),
        Level::Trace => abbr.magenta(),
    }
}

/// Emitting module, e.g. `tereus_std::kafka::service`
fn caller<'a>(record: &'a Record<'a>) -> &'a str {
    record.module_path().unwrap_or_else(|| record.target())
}

/// `file:line` of the log statement, when known
fn file_location(record: &Record) -> Option<String> {
    record.file().map(|file| match record.line() {
        Some(line) => format!("{}:{}", file, line),
        None => file.to_string(),
    })
}

/// `2024-05-01 12:00:00.000 INF message caller=... file=...`
pub(crate) fn raw_format<const CALLER: bool, const FILE: bool, const COLOR: bool>(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let timestamp = now.format(TIMESTAMP).to_string();
    if COLOR {
        write!(
            w,
            "{} {} {}",
            timestamp.dimmed(),
            colored_level(record.level()),
            record.args()
        )?;
    } else {
        write!(
            w,
            "{} {} {}",
            timestamp,
            level_abbr(record.level()),
            record.args()
        )?;
    }

    if CALLER {
        write!(w, " caller={}", caller(record))?;
    }
    if FILE {
        if let Some(location) = file_location(record) {
            write!(w, " file={}", location)?;
        }
    }
    Ok(())
}

pub(crate) fn json_format<const CALLER: bool, const FILE: bool>(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let mut entry = serde_json::json!({
        "timestamp": now.format(JSON_TIMESTAMP).to_string(),
        "level": record.level().as_str().to_lowercase(),
        "message": record.args().to_string(),
    });
    if CALLER {
        entry["caller"] = caller(record).into();
    }
    if FILE {
        if let Some(location) = file_location(record) {
            entry["file"] = location.into();
        }
    }

    match serde_json::to_string(&entry) {
        Ok(line) => w.write_all(line.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

/// Format function for the given output settings
pub(crate) fn select_format(
    format: LogFormat,
    report_caller: bool,
    show_filename: bool,
    color: bool,
) -> FormatFunction {
    match (format, report_caller, show_filename, color) {
        (LogFormat::Json, false, false, _) => json_format::<false, false>,
        (LogFormat::Json, true, false, _) => json_format::<true, false>,
        (LogFormat::Json, false, true, _) => json_format::<false, true>,
        (LogFormat::Json, true, true, _) => json_format::<true, true>,
        (LogFormat::Raw, false, false, false) => raw_format::<false, false, false>,
        (LogFormat::Raw, true, false, false) => raw_format::<true, false, false>,
        (LogFormat::Raw, false, true, false) => raw_format::<false, true, false>,
        (LogFormat::Raw, true, true, false) => raw_format::<true, true, false>,
        (LogFormat::Raw, false, false, true) => raw_format::<false, false, true>,
        (LogFormat::Raw, true, false, true) => raw_format::<true, false, true>,
        (LogFormat::Raw, false, true, true) => raw_format::<false, true, true>,
        (LogFormat::Raw, true, true, true) => raw_format::<true, true, true>,
    }
}
