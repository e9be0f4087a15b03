//! Test modules for the Kafka client

mod service;

use crate::core::retry::RetryPolicy;
use crate::kafka::KafkaConfig;
use std::time::Duration;

/// Configuration with a fast, short backoff so error paths finish quickly
pub(super) fn test_config() -> KafkaConfig {
    KafkaConfig {
        read_backoff: RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2,
        },
        ..KafkaConfig::new("memory:9092", "test-group")
    }
}
