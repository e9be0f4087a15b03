//! NsqService - producer plus registered consumers

use crate::nsq::names::{validate_channel, validate_topic};
use crate::nsq::{
    ConsumerHandle, MessageHandler, NsqConfig, NsqConnector, NsqError, NsqProducer, NsqResult,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// NSQ queue client
///
/// Publishing goes straight to the producer. Each `register_handler` call
/// subscribes a topic/channel pair and starts a handler pool; consumers are
/// kept until [`shutdown`](Self::shutdown).
///
/// # Thread Safety
///
/// Registration appends to the consumer registry under the write lock.
/// Shutdown marks the registry closed under the same lock before stopping
/// anything, so a registration racing with it either lands in the list that
/// gets stopped or is refused with [`NsqError::ShutDown`]. Both may be called
/// concurrently from any number of tasks through `Arc<NsqService<_>>`.
pub struct NsqService<C: NsqConnector> {
    config: NsqConfig,
    connector: C,
    producer: Arc<dyn NsqProducer>,
    consumers: RwLock<ConsumerRegistry>,
}

#[derive(Default)]
struct ConsumerRegistry {
    consumers: Vec<ConsumerHandle>,
    shut_down: bool,
}

impl<C: NsqConnector> NsqService<C> {
    /// Validate `config` and create the producer
    pub fn new(config: NsqConfig, connector: C) -> NsqResult<Self> {
        config.validate()?;
        let producer = connector.producer(&config.nsqd_endpoint)?;

        Ok(Self {
            config,
            connector,
            producer,
            consumers: RwLock::new(ConsumerRegistry::default()),
        })
    }

    pub fn config(&self) -> &NsqConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Publish `body` to `topic`
    pub async fn publish(&self, topic: &str, body: impl Into<Vec<u8>>) -> NsqResult<()> {
        validate_topic(topic)?;
        self.producer.publish(topic, body.into()).await
    }

    /// Subscribe `handler` to `topic`/`channel`
    ///
    /// Nodes are discovered through the configured lookupd endpoint. Messages
    /// with an empty body are acknowledged without reaching the handler.
    /// Fails with [`NsqError::ShutDown`] once [`shutdown`](Self::shutdown)
    /// has started.
    pub async fn register_handler<H: MessageHandler>(
        &self,
        topic: &str,
        channel: &str,
        handler: H,
    ) -> NsqResult<()> {
        validate_topic(topic)?;
        validate_channel(channel)?;
        if self.consumers.read().await.shut_down {
            return Err(NsqError::ShutDown);
        }

        let concurrency = self.config.handler_concurrency();
        let source = self
            .connector
            .subscribe(
                topic,
                channel,
                &self.config.nsqlookupd_endpoint,
                concurrency,
            )
            .await?;

        let consumer =
            ConsumerHandle::start(topic, channel, source, Arc::new(handler), concurrency);

        let mut registry = self.consumers.write().await;
        if registry.shut_down {
            drop(registry);
            log::debug!(
                "Service shut down while registering {}/{}, stopping its consumer",
                topic,
                channel
            );
            consumer.stop().await;
            return Err(NsqError::ShutDown);
        }
        registry.consumers.push(consumer);
        log::info!(
            "Registered NSQ handler for {}/{} with {} workers",
            topic,
            channel,
            concurrency
        );
        Ok(())
    }

    /// Number of registered consumers
    pub async fn consumer_count(&self) -> usize {
        self.consumers.read().await.consumers.len()
    }

    /// Stop every registered consumer, then the producer
    ///
    /// Later registrations are refused.
    pub async fn shutdown(&self) {
        {
            let mut registry = self.consumers.write().await;
            registry.shut_down = true;
            let registry = registry.downgrade();
            for consumer in registry.consumers.iter() {
                consumer.stop().await;
            }
            log::debug!("Stopped {} NSQ consumers", registry.consumers.len());
        }

        self.producer.stop().await;
    }
}

#[cfg(feature = "nsq")]
impl NsqService<crate::nsq::TokioNsqConnector> {
    /// Create a service backed by tokio-nsq
    pub fn connect(config: NsqConfig) -> NsqResult<Self> {
        Self::new(config, crate::nsq::TokioNsqConnector::new())
    }
}
