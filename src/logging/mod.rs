//! Logging Bootstrap
//!
//! One call configures the process logger from a [`LogConfig`]:
//!
//! - **Format**: raw text or JSON lines (default JSON)
//! - **Level**: `fatal` through `trace` (default info; `fatal` filters as error)
//! - **Annotations**: emitting module (`report_caller`) and `file:line`
//!   (`show_filename`)
//! - **Error reporting**: with a DSN, error records are sent to Sentry and
//!   warn/info records are kept as breadcrumbs
//!
//! ```rust,no_run
//! use tereus_std::logging::{recover_and_log_panic, setup_log, LogConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LogConfig::from_toml_str(r#"
//!     format = "raw"
//!     level = "debug"
//!     show_filename = true
//! "#)?;
//! let _log = setup_log(&config)?;
//!
//! recover_and_log_panic(|| log::info!("service started"));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod format;
mod panic;
mod reporter;
mod setup;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use error::{LoggingError, LoggingResult};
pub use panic::{recover_and_log_panic, recover_and_log_panic_async};
pub use reporter::ErrorReporter;
pub use setup::{setup_log, LogHandle};
