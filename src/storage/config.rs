//! Object storage configuration

use crate::storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings for an S3-compatible store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Host and port, without scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Bucket all object operations apply to
    pub bucket: String,
    /// Use HTTPS
    pub secure: bool,
    pub region: String,
    /// Address buckets as `host/bucket` instead of `bucket.host`
    pub path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            secure: false,
            region: "us-east-1".to_string(),
            path_style: true,
        }
    }
}

// Keep credentials out of logs
impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("secure", &self.secure)
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl S3Config {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
        secure: bool,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            secure,
            ..Self::default()
        }
    }

    /// Parse a configuration table from TOML text
    pub fn from_toml_str(contents: &str) -> StorageResult<Self> {
        toml::from_str(contents).map_err(|e| StorageError::Configuration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(StorageError::Configuration {
                message: "endpoint must not be empty".to_string(),
            });
        }
        if self.endpoint.contains("://") {
            return Err(StorageError::Configuration {
                message: format!(
                    "endpoint '{}' must not include a scheme, use `secure` instead",
                    self.endpoint
                ),
            });
        }
        if self.bucket.trim().is_empty() {
            return Err(StorageError::Configuration {
                message: "bucket must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Endpoint with the scheme selected by `secure`
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}
