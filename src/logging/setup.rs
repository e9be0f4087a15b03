//! Process logger installation

use crate::logging::format::select_format;
use crate::logging::{ErrorReporter, LogConfig, LogLevel, LoggingError, LoggingResult};
use flexi_logger::{Logger, LoggerHandle};
use sentry_log::{LogFilter, SentryLogger};
use std::time::Duration;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything [`setup_log`] installed
///
/// Keep it alive for the life of the process: dropping it flushes pending
/// error reports and shuts the reporter down.
pub struct LogHandle {
    config: LogConfig,
    reporter: Option<ErrorReporter>,
    logger: LoggerHandle,
}

impl LogHandle {
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// The error reporter, when a DSN was configured
    pub fn reporter(&self) -> Option<&ErrorReporter> {
        self.reporter.as_ref()
    }

    /// Change the level filter without reinstalling the logger
    pub fn set_level(&mut self, level: LogLevel) -> LoggingResult<()> {
        self.logger.parse_and_push_temp_spec(level.spec())?;
        log::set_max_level(level.filter());
        Ok(())
    }

    pub fn flush(&self) {
        self.logger.flush();
        if let Some(reporter) = &self.reporter {
            reporter.flush(FLUSH_TIMEOUT);
        }
    }
}

impl Drop for LogHandle {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Errors become Sentry events; warnings and info become breadcrumbs
fn sentry_filter(metadata: &log::Metadata<'_>) -> LogFilter {
    match metadata.level() {
        log::Level::Error => LogFilter::Event,
        log::Level::Warn | log::Level::Info => LogFilter::Breadcrumb,
        log::Level::Debug | log::Level::Trace => LogFilter::Ignore,
    }
}

/// Install the process logger described by `config`
///
/// Unknown format and level names fall back to JSON and info. When a DSN is
/// configured the reporter is started before the logger, so an invalid DSN
/// leaves the process without a logger rather than with a half-configured one.
/// Fails with [`LoggingError::AlreadyInstalled`] if any `log` logger is
/// already set.
pub fn setup_log(config: &LogConfig) -> LoggingResult<LogHandle> {
    let level = config.log_level();
    let format = select_format(
        config.log_format(),
        config.report_caller,
        config.show_filename,
        config.color,
    );

    let reporter = if config.reporting_enabled() {
        Some(ErrorReporter::new(config)?)
    } else {
        None
    };

    let (logger, handle) = Logger::try_with_str(level.spec())?.format(format).build()?;
    let installed = if reporter.is_some() {
        log::set_boxed_logger(Box::new(SentryLogger::with_dest(logger).filter(sentry_filter)))
    } else {
        log::set_boxed_logger(logger)
    };
    installed.map_err(|_| LoggingError::AlreadyInstalled)?;
    log::set_max_level(level.filter());

    log::debug!(
        "Logging configured: format={}, level={}, reporting={}",
        config.log_format().as_ref(),
        level.as_ref(),
        reporter.is_some()
    );

    Ok(LogHandle {
        config: config.clone(),
        reporter,
        logger: handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_sentry_filter_levels() {
        let metadata = |level| log::Metadata::builder().level(level).build();

        assert!(matches!(
            sentry_filter(&metadata(log::Level::Error)),
            LogFilter::Event
        ));
        assert!(matches!(
            sentry_filter(&metadata(log::Level::Warn)),
            LogFilter::Breadcrumb
        ));
        assert!(matches!(
            sentry_filter(&metadata(log::Level::Debug)),
            LogFilter::Ignore
        ));
    }

    #[test]
    #[serial]
    fn test_invalid_dsn_fails_before_installing() {
        let config = LogConfig {
            sentry_dsn: "::::".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            setup_log(&config),
            Err(LoggingError::InvalidDsn { .. })
        ));
    }

    // The only test in this binary that installs the process logger
    #[test]
    #[serial]
    fn test_setup_log_installs_once_and_changes_level() {
        let config = LogConfig {
            format: "RAW".to_string(),
            level: "WARN".to_string(),
            ..LogConfig::default()
        };

        let mut handle = setup_log(&config).unwrap();
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
        assert!(handle.reporter().is_none());
        assert_eq!(handle.config().format, "RAW");

        handle.set_level(LogLevel::Debug).unwrap();
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        log::debug!("debug output enabled");

        assert!(matches!(
            setup_log(&config),
            Err(LoggingError::AlreadyInstalled)
        ));
    }
}
