//! Kafka client configuration

use crate::core::retry::RetryPolicy;
use crate::kafka::{KafkaError, KafkaResult};
use serde::{Deserialize, Serialize};

/// Connection and consumer settings for [`KafkaService`](crate::kafka::KafkaService)
///
/// ```rust
/// use tereus_std::kafka::KafkaConfig;
///
/// let config = KafkaConfig::from_toml_str(r#"
///     endpoint = "localhost:9092"
///     consumer_group_id = "transpiler"
///
///     [read_backoff]
///     max_attempts = 5
/// "#).unwrap();
/// assert_eq!(config.stream_buffer, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Broker address (`host:port`)
    pub endpoint: String,
    /// Consumer group every reader joins
    pub consumer_group_id: String,
    /// Capacity of the channel between a consume pump and its caller
    pub stream_buffer: usize,
    /// Backoff applied by consume pumps after read errors
    pub read_backoff: RetryPolicy,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            consumer_group_id: String::new(),
            stream_buffer: 1,
            read_backoff: RetryPolicy::default(),
        }
    }
}

impl KafkaConfig {
    pub fn new(endpoint: impl Into<String>, consumer_group_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            consumer_group_id: consumer_group_id.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration table from TOML text
    pub fn from_toml_str(contents: &str) -> KafkaResult<Self> {
        toml::from_str(contents).map_err(|e| KafkaError::Configuration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> KafkaResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(KafkaError::Configuration {
                message: "endpoint must not be empty".to_string(),
            });
        }
        if self.consumer_group_id.trim().is_empty() {
            return Err(KafkaError::Configuration {
                message: "consumer_group_id must not be empty".to_string(),
            });
        }
        if self.stream_buffer == 0 {
            return Err(KafkaError::Configuration {
                message: "stream_buffer must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
