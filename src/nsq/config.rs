//! NSQ client configuration

use crate::nsq::{NsqError, NsqResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Endpoints and consumer tuning for [`NsqService`](crate::nsq::NsqService)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NsqConfig {
    /// nsqd TCP address used by the producer
    pub nsqd_endpoint: String,
    /// nsqlookupd HTTP address consumers use to discover nsqd nodes
    pub nsqlookupd_endpoint: String,
    /// Concurrent handler invocations per registered consumer; defaults to
    /// the number of logical cores
    pub concurrency: Option<usize>,
}

impl NsqConfig {
    pub fn new(nsqd_endpoint: impl Into<String>, nsqlookupd_endpoint: impl Into<String>) -> Self {
        Self {
            nsqd_endpoint: nsqd_endpoint.into(),
            nsqlookupd_endpoint: nsqlookupd_endpoint.into(),
            concurrency: None,
        }
    }

    /// Parse a configuration table from TOML text
    pub fn from_toml_str(contents: &str) -> NsqResult<Self> {
        toml::from_str(contents).map_err(|e| NsqError::Configuration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> NsqResult<()> {
        if self.nsqd_endpoint.trim().is_empty() {
            return Err(NsqError::Configuration {
                message: "nsqd_endpoint must not be empty".to_string(),
            });
        }
        if self.nsqlookupd_endpoint.trim().is_empty() {
            return Err(NsqError::Configuration {
                message: "nsqlookupd_endpoint must not be empty".to_string(),
            });
        }
        if self.concurrency == Some(0) {
            return Err(NsqError::Configuration {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Size of each consumer's handler pool
    pub fn handler_concurrency(&self) -> usize {
        self.concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            })
            .max(1)
    }
}
