//! librdkafka-backed connector (feature `kafka`)

use crate::kafka::{BrokerConnector, KafkaError, KafkaResult, TopicReader, TopicWriter};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::Message;
use std::sync::Arc;
use std::time::Duration;

/// How long `close` waits for queued messages to be delivered
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on how long the broker holds a fetch open
const MAX_FETCH_WAIT_MS: &str = "1000";

/// Opens rdkafka producers and stream consumers against one bootstrap server
pub struct RdKafkaConnector {
    endpoint: String,
}

impl RdKafkaConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn producer_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.endpoint);
        config
    }

    /// Readers may subscribe before the first write creates the topic
    fn consumer_config(&self, group_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.endpoint)
            .set("group.id", group_id)
            .set("auto.offset.reset", "latest")
            .set("fetch.wait.max.ms", MAX_FETCH_WAIT_MS)
            .set("enable.auto.commit", "true")
            .set("allow.auto.create.topics", "true");
        config
    }
}

impl BrokerConnector for RdKafkaConnector {
    fn open_writer(&self, topic: &str) -> KafkaResult<Arc<dyn TopicWriter>> {
        let producer: FutureProducer = self
            .producer_config()
            .create()
            .map_err(|e| KafkaError::Connect {
                topic: topic.to_string(),
                role: "writer",
                message: e.to_string(),
            })?;

        Ok(Arc::new(RdKafkaWriter {
            topic: topic.to_string(),
            producer,
        }))
    }

    fn open_reader(&self, topic: &str, group_id: &str) -> KafkaResult<Box<dyn TopicReader>> {
        let connect_error = |e: rdkafka::error::KafkaError| KafkaError::Connect {
            topic: topic.to_string(),
            role: "reader",
            message: e.to_string(),
        };

        let consumer: StreamConsumer = self
            .consumer_config(group_id)
            .create()
            .map_err(connect_error)?;
        consumer.subscribe(&[topic]).map_err(connect_error)?;

        Ok(Box::new(RdKafkaReader {
            topic: topic.to_string(),
            consumer,
        }))
    }
}

struct RdKafkaWriter {
    topic: String,
    producer: FutureProducer,
}

#[async_trait]
impl TopicWriter for RdKafkaWriter {
    async fn write(&self, key: &[u8], payload: &[u8]) -> KafkaResult<()> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);
        self.producer
            .send(record, Timeout::Never)
            .await
            .map(|_| ())
            .map_err(|(e, _)| KafkaError::Write {
                topic: self.topic.clone(),
                message: e.to_string(),
            })
    }

    async fn close(&self) -> KafkaResult<()> {
        self.producer
            .flush(Timeout::After(FLUSH_TIMEOUT))
            .map_err(|e| KafkaError::Close {
                topic: self.topic.clone(),
                role: "writer",
                message: e.to_string(),
            })
    }
}

struct RdKafkaReader {
    topic: String,
    consumer: StreamConsumer,
}

#[async_trait]
impl TopicReader for RdKafkaReader {
    async fn read(&mut self) -> KafkaResult<Vec<u8>> {
        let message = self.consumer.recv().await.map_err(|e| KafkaError::Read {
            topic: self.topic.clone(),
            message: e.to_string(),
        })?;
        Ok(message.payload().map(<[u8]>::to_vec).unwrap_or_default())
    }

    async fn close(&mut self) -> KafkaResult<()> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
