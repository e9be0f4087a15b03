//! KafkaService - topic publishing and consumer-group streaming
//!
//! Writers are opened lazily and cached per topic for the lifetime of the
//! service. Every `consume` call gets its own reader and background pump.

use crate::core::sync::lock_or_err;
use crate::kafka::{
    BrokerConnector, KafkaConfig, KafkaError, KafkaResult, MessageStream, TopicWriter,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type WriterCache = HashMap<String, Arc<dyn TopicWriter>>;

/// Kafka topic client
///
/// # Example
///
/// ```rust,no_run
/// use tereus_std::kafka::{InMemoryBroker, KafkaConfig, KafkaService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = KafkaConfig::new("localhost:9092", "transpiler");
/// let service = KafkaService::new(config, InMemoryBroker::new())?;
///
/// let mut stream = service.consume("submissions")?;
/// service.publish("submissions", "id-1", b"payload").await?;
///
/// if let Some(payload) = stream.recv().await {
///     println!("Received {} bytes", payload.len());
/// }
/// stream.close().await?;
/// service.close_all_writers().await;
/// # Ok(())
/// # }
/// ```
pub struct KafkaService<C: BrokerConnector> {
    config: KafkaConfig,
    connector: Arc<C>,
    writers: Mutex<WriterCache>,
}

impl<C: BrokerConnector> KafkaService<C> {
    pub fn new(config: KafkaConfig, connector: C) -> KafkaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connector: Arc::new(connector),
            writers: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &KafkaConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Number of cached topic writers
    pub fn writer_count(&self) -> KafkaResult<usize> {
        Ok(self.lock_writers()?.len())
    }

    fn lock_writers(&self) -> KafkaResult<MutexGuard<'_, WriterCache>> {
        lock_or_err(self.writers.lock(), "kafka writer cache", |message| {
            KafkaError::Internal { message }
        })
    }

    /// Return the cached writer for `topic`, opening it on first use
    fn writer_for_topic(&self, topic: &str) -> KafkaResult<Arc<dyn TopicWriter>> {
        let mut writers = self.lock_writers()?;

        if let Some(writer) = writers.get(topic) {
            return Ok(Arc::clone(writer));
        }

        // Opened under the lock so concurrent publishers cannot race a second writer in
        let writer = self.connector.open_writer(topic)?;
        log::debug!("Opened kafka writer for topic '{}'", topic);
        writers.insert(topic.to_string(), Arc::clone(&writer));
        Ok(writer)
    }

    /// Publish one keyed message to `topic`
    pub async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> KafkaResult<()> {
        let writer = self.writer_for_topic(topic)?;
        writer.write(key.as_bytes(), payload).await
    }

    /// Start streaming payloads from `topic` for the configured consumer group
    ///
    /// Must be called from within a tokio runtime; the read pump is spawned
    /// onto it.
    pub fn consume(&self, topic: &str) -> KafkaResult<MessageStream> {
        let reader = self
            .connector
            .open_reader(topic, &self.config.consumer_group_id)?;
        log::debug!(
            "Opened kafka reader for topic '{}' in group '{}'",
            topic,
            self.config.consumer_group_id
        );

        Ok(MessageStream::spawn(
            topic.to_string(),
            reader,
            self.config.stream_buffer,
            self.config.read_backoff.clone(),
        ))
    }

    /// Close every cached writer
    ///
    /// Close failures are logged and do not stop the remaining writers from
    /// closing. The cache is emptied, so a later publish opens a fresh writer.
    pub async fn close_all_writers(&self) {
        let writers: Vec<(String, Arc<dyn TopicWriter>)> = match self.writers.lock() {
            Ok(mut writers) => writers.drain().collect(),
            Err(e) => {
                log::error!("Failed to close kafka writers: writer cache poisoned: {}", e);
                return;
            }
        };

        for (topic, writer) in writers {
            if let Err(e) = writer.close().await {
                log::error!("Failed to close kafka writer for topic '{}': {}", topic, e);
            }
        }
    }
}

#[cfg(feature = "kafka")]
impl KafkaService<crate::kafka::RdKafkaConnector> {
    /// Create a service backed by librdkafka
    pub fn connect(config: KafkaConfig) -> KafkaResult<Self> {
        let connector = crate::kafka::RdKafkaConnector::new(config.endpoint.clone());
        Self::new(config, connector)
    }
}
