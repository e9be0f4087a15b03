//! Kafka Topic Client
//!
//! Thin wrapper over a Kafka client library exposing keyed publishing and
//! consumer-group streaming.
//!
//! # Overview
//!
//! - **Writers** are opened lazily, one per topic, and reused until
//!   [`KafkaService::close_all_writers`]
//! - **Consume** opens a dedicated reader per call, bound to the configured
//!   consumer group and starting at the latest offset, and pumps payloads
//!   into a bounded channel from a background task
//! - **Read failures** back off exponentially; after the configured number of
//!   consecutive failures the stream ends and the error is reported by
//!   [`MessageStream::close`]
//!
//! # Architecture
//!
//! ```text
//!  publish(topic, key, payload)          consume(topic)
//!          │                                   │
//!          ▼                                   ▼
//! ┌──────────────────┐               ┌──────────────────┐
//! │  writer cache    │               │  reader + pump   │── payloads ──▶ MessageStream
//! │ topic → writer   │               │  (tokio task)    │
//! └────────┬─────────┘               └────────┬─────────┘
//!          │          BrokerConnector         │
//!          └──────────────┬───────────────────┘
//!                         ▼
//!          InMemoryBroker | RdKafkaConnector (feature "kafka")
//! ```

mod config;
mod error;
mod memory;
#[cfg(feature = "kafka")]
mod librdkafka;
mod service;
mod stream;
mod traits;

pub use config::KafkaConfig;
pub use error::{KafkaError, KafkaResult};
pub use memory::{InMemoryBroker, Record};
#[cfg(feature = "kafka")]
pub use librdkafka::RdKafkaConnector;
pub use service::KafkaService;
pub use stream::MessageStream;
pub use traits::{BrokerConnector, TopicReader, TopicWriter};

#[cfg(test)]
mod tests;
