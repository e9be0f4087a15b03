//! Log configuration values

use crate::logging::{LoggingError, LoggingResult};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Output format; unknown names fall back to [`LogFormat::Json`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human readable single-line text
    Raw,
    /// One JSON object per line
    #[default]
    Json,
}

impl LogFormat {
    pub fn parse_or_default(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }
}

/// Minimum severity; unknown names fall back to [`LogLevel::Info`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse_or_default(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    /// The `log` filter for this level; `Fatal` filters like `Error`
    pub fn filter(self) -> log::LevelFilter {
        match self {
            Self::Fatal | Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    /// flexi_logger spec string
    pub(crate) fn spec(self) -> &'static str {
        match self {
            Self::Fatal | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Process logging settings
///
/// `format` and `level` are kept as text so configuration files may carry
/// any spelling; use [`log_format`](Self::log_format) and
/// [`log_level`](Self::log_level) for the resolved values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `raw` or `json`
    pub format: String,
    /// `fatal`, `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
    /// Error-tracking DSN; empty disables reporting
    pub sentry_dsn: String,
    /// Proxy for reporting over both HTTP and HTTPS
    pub sentry_proxy: String,
    /// Annotate records with the emitting module
    pub report_caller: bool,
    /// Annotate records with `file:line`
    pub show_filename: bool,
    /// Environment label attached to reported events
    pub env: String,
    /// Colour the level in raw output
    pub color: bool,
}

impl std::fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("sentry_dsn", &(!self.sentry_dsn.is_empty()).then_some("<set>"))
            .field("sentry_proxy", &self.sentry_proxy)
            .field("report_caller", &self.report_caller)
            .field("show_filename", &self.show_filename)
            .field("env", &self.env)
            .field("color", &self.color)
            .finish()
    }
}

impl LogConfig {
    /// Parse a configuration table from TOML text
    pub fn from_toml_str(contents: &str) -> LoggingResult<Self> {
        toml::from_str(contents).map_err(|e| LoggingError::Configuration {
            message: e.to_string(),
        })
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse_or_default(&self.format)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse_or_default(&self.level)
    }

    /// Environment label, `"unknown"` when unset
    pub fn environment(&self) -> &str {
        if self.env.trim().is_empty() {
            "unknown"
        } else {
            &self.env
        }
    }

    pub fn reporting_enabled(&self) -> bool {
        !self.sentry_dsn.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_level_parsing_is_case_insensitive() {
        assert_eq!(LogLevel::parse_or_default("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse_or_default("Warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse_or_default("WARN").filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(LogLevel::parse_or_default("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse_or_default(""), LogLevel::Info);
    }

    #[test]
    fn test_every_level_round_trips_through_its_name() {
        for level in LogLevel::iter() {
            assert_eq!(LogLevel::parse_or_default(level.as_ref()), level);
        }
    }

    #[test]
    fn test_fatal_filters_as_error() {
        assert_eq!(LogLevel::Fatal.filter(), log::LevelFilter::Error);
        assert_eq!(LogLevel::Fatal.spec(), "error");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::parse_or_default("RAW"), LogFormat::Raw);
        assert_eq!(LogFormat::parse_or_default("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse_or_default("logfmt"), LogFormat::Json);
        assert_eq!(LogFormat::iter().count(), 2);
    }

    #[test]
    fn test_config_from_toml_str() {
        let config = LogConfig::from_toml_str(
            r#"
            format = "raw"
            level = "debug"
            report_caller = true
            "#,
        )
        .unwrap();

        assert_eq!(config.log_format(), LogFormat::Raw);
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert!(config.report_caller);
        assert!(!config.show_filename);
        assert!(!config.reporting_enabled());
        assert_eq!(config.environment(), "unknown");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_debug_hides_dsn() {
        let config = LogConfig {
            sentry_dsn: "https://secret@sentry.example.com/1".to_string(),
            ..LogConfig::default()
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
