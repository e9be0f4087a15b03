//! tokio-nsq backed connector (feature `nsq`)

use crate::nsq::{
    Delivery, MessageSource, NsqConnector, NsqError, NsqMessage, NsqProducer, NsqResult,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_nsq::{
    NSQChannel, NSQConsumer, NSQConsumerConfig, NSQConsumerConfigSources,
    NSQConsumerLookupConfig, NSQEvent, NSQProducer, NSQProducerConfig, NSQRequeueDelay,
    NSQTopic,
};

/// Creates tokio-nsq producers and lookupd-discovered consumers
#[derive(Debug, Clone, Default)]
pub struct TokioNsqConnector;

impl TokioNsqConnector {
    pub fn new() -> Self {
        Self
    }
}

fn lookupd_address(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

#[async_trait]
impl NsqConnector for TokioNsqConnector {
    fn producer(&self, nsqd_endpoint: &str) -> NsqResult<Arc<dyn NsqProducer>> {
        let producer = NSQProducerConfig::new(nsqd_endpoint).build();
        Ok(Arc::new(TokioNsqProducer {
            producer: Mutex::new(Some(producer)),
        }))
    }

    async fn subscribe(
        &self,
        topic: &str,
        channel: &str,
        lookupd_endpoint: &str,
        max_in_flight: usize,
    ) -> NsqResult<Box<dyn MessageSource>> {
        let invalid = |kind: &'static str, name: &str| NsqError::InvalidName {
            kind,
            name: name.to_string(),
        };
        let nsq_topic = NSQTopic::new(topic).ok_or_else(|| invalid("topic", topic))?;
        let nsq_channel = NSQChannel::new(channel).ok_or_else(|| invalid("channel", channel))?;

        let mut addresses = HashSet::new();
        addresses.insert(lookupd_address(lookupd_endpoint));

        let max_in_flight = u32::try_from(max_in_flight).unwrap_or(u32::MAX);
        let consumer = NSQConsumerConfig::new(nsq_topic, nsq_channel)
            .set_max_in_flight(max_in_flight)
            .set_sources(NSQConsumerConfigSources::Lookup(
                NSQConsumerLookupConfig::new().set_addresses(addresses),
            ))
            .build();

        Ok(Box::new(TokioNsqSource {
            consumer: Some(consumer),
        }))
    }
}

/// Outcome of a publish for one producer event, `None` while still waiting
fn publish_response(event: Option<NSQEvent>) -> Option<Result<(), String>> {
    match event {
        Some(NSQEvent::Ok()) => Some(Ok(())),
        Some(NSQEvent::Healthy()) | Some(NSQEvent::Message(_)) => None,
        Some(NSQEvent::Unhealthy()) => Some(Err("nsqd connection unhealthy".to_string())),
        None => Some(Err("producer closed".to_string())),
    }
}

struct TokioNsqProducer {
    producer: Mutex<Option<NSQProducer>>,
}

#[async_trait]
impl NsqProducer for TokioNsqProducer {
    async fn publish(&self, topic: &str, body: Vec<u8>) -> NsqResult<()> {
        let publish_error = |message: String| NsqError::Publish {
            topic: topic.to_string(),
            message,
        };
        let nsq_topic = NSQTopic::new(topic).ok_or_else(|| NsqError::InvalidName {
            kind: "topic",
            name: topic.to_string(),
        })?;

        let mut guard = self.producer.lock().await;
        let producer = guard
            .as_mut()
            .ok_or_else(|| publish_error("producer is stopped".to_string()))?;

        producer
            .publish(&nsq_topic, body)
            .await
            .map_err(|e| publish_error(e.to_string()))?;

        // Wait for nsqd's response to this publish; health events come first
        loop {
            if let Some(response) = publish_response(producer.consume().await) {
                return response.map_err(publish_error);
            }
        }
    }

    async fn stop(&self) {
        if self.producer.lock().await.take().is_some() {
            log::debug!("NSQ producer stopped");
        }
    }
}

struct TokioNsqSource {
    consumer: Option<NSQConsumer>,
}

#[async_trait]
impl MessageSource for TokioNsqSource {
    async fn next(&mut self) -> Option<Box<dyn Delivery>> {
        let consumer = self.consumer.as_mut()?;
        let message = consumer.consume_filtered().await?;
        Some(Box::new(TokioNsqDelivery {
            message: NsqMessage {
                body: message.body.clone(),
                attempts: message.attempt,
                timestamp: message.timestamp,
            },
            inner: message,
        }))
    }

    async fn stop(&mut self) {
        // Dropping the consumer closes its nsqd connections
        self.consumer.take();
    }
}

struct TokioNsqDelivery {
    message: NsqMessage,
    inner: tokio_nsq::NSQMessage,
}

#[async_trait]
impl Delivery for TokioNsqDelivery {
    fn message(&self) -> &NsqMessage {
        &self.message
    }

    async fn finish(self: Box<Self>) {
        self.inner.finish().await;
    }

    async fn requeue(self: Box<Self>) {
        self.inner.requeue(NSQRequeueDelay::DefaultDelay).await;
    }
}
