//! Broker client seams
//!
//! `KafkaService` never talks to a broker directly. It asks a
//! [`BrokerConnector`] for per-topic writers and per-call readers, which keeps
//! the caching and pump logic independent of the client library in use.

use crate::kafka::KafkaResult;
use async_trait::async_trait;
use std::sync::Arc;

/// A reusable connection publishing to one topic
#[async_trait]
pub trait TopicWriter: Send + Sync {
    /// Write a single keyed message, blocking until the broker accepts it
    async fn write(&self, key: &[u8], payload: &[u8]) -> KafkaResult<()>;

    /// Flush and release the connection
    async fn close(&self) -> KafkaResult<()>;
}

/// A consumer-group member reading one topic
#[async_trait]
pub trait TopicReader: Send {
    /// Wait for the next message and return its payload
    async fn read(&mut self) -> KafkaResult<Vec<u8>>;

    /// Leave the group and release the connection
    async fn close(&mut self) -> KafkaResult<()>;
}

/// Factory for writers and readers bound to one broker
pub trait BrokerConnector: Send + Sync + 'static {
    /// Open a writer for `topic`; topics are created on first write if absent
    fn open_writer(&self, topic: &str) -> KafkaResult<Arc<dyn TopicWriter>>;

    /// Open a reader for `topic` in `group_id`, starting from the latest offset
    /// when the group has no committed position
    fn open_reader(&self, topic: &str, group_id: &str) -> KafkaResult<Box<dyn TopicReader>>;
}
