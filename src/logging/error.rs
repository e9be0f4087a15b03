//! Logging Error Types

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid logging configuration: {message}")]
    Configuration { message: String },

    #[error("Invalid error-reporting DSN: {source}")]
    InvalidDsn {
        #[source]
        source: sentry::types::ParseDsnError,
    },

    #[error("Failed to install logger: {source}")]
    Logger {
        #[from]
        source: flexi_logger::FlexiLoggerError,
    },

    #[error("A logger is already installed for this process")]
    AlreadyInstalled,
}

/// Result type for logging setup
pub type LoggingResult<T> = Result<T, LoggingError>;
