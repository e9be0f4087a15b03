//! Error reporting to Sentry

use crate::logging::{LogConfig, LoggingError, LoggingResult};
use std::borrow::Cow;
use std::time::Duration;

/// Live Sentry client; events stop being sent once it is dropped
pub struct ErrorReporter {
    guard: sentry::ClientInitGuard,
    environment: String,
}

impl ErrorReporter {
    /// Start a client for `config.sentry_dsn`
    ///
    /// Release is this crate's name and version; `sentry_proxy`, when set,
    /// is used for both HTTP and HTTPS.
    pub fn new(config: &LogConfig) -> LoggingResult<Self> {
        let dsn: sentry::types::Dsn = config
            .sentry_dsn
            .trim()
            .parse()
            .map_err(|source| LoggingError::InvalidDsn { source })?;

        let proxy = Some(config.sentry_proxy.trim())
            .filter(|proxy| !proxy.is_empty())
            .map(|proxy| Cow::Owned(proxy.to_string()));
        let environment = config.environment().to_string();

        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            environment: Some(Cow::Owned(environment.clone())),
            attach_stacktrace: true,
            http_proxy: proxy.clone(),
            https_proxy: proxy,
            ..Default::default()
        });

        Ok(Self { guard, environment })
    }

    pub fn is_enabled(&self) -> bool {
        self.guard.is_enabled()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Wait up to `timeout` for queued events to be sent
    pub fn flush(&self, timeout: Duration) -> bool {
        self.guard.flush(Some(timeout))
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("enabled", &self.is_enabled())
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_invalid_dsn_is_rejected() {
        let config = LogConfig {
            sentry_dsn: "not a dsn".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            ErrorReporter::new(&config),
            Err(LoggingError::InvalidDsn { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_reporter_uses_environment_label() {
        let config = LogConfig {
            sentry_dsn: "https://public@sentry.example.com/1".to_string(),
            sentry_proxy: "http://proxy.internal:3128".to_string(),
            env: "staging".to_string(),
            ..LogConfig::default()
        };
        let reporter = ErrorReporter::new(&config).unwrap();

        assert!(reporter.is_enabled());
        assert_eq!(reporter.environment(), "staging");
        assert!(reporter.flush(Duration::from_millis(100)));
    }
}
