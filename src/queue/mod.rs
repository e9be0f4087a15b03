//! Queue Façade
//!
//! Minimal publish/subscribe surface over [`NsqService`] for services that
//! only need "send bytes to a topic" and "run this closure for every message
//! on topic/channel".
//!
//! # Example
//!
//! ```rust
//! use tereus_std::nsq::{InMemoryNsq, NsqConfig};
//! use tereus_std::queue::QueueService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = QueueService::new(
//!     NsqConfig::new("127.0.0.1:4150", "127.0.0.1:4161"),
//!     InMemoryNsq::new(),
//! )?;
//!
//! queue
//!     .add_handler("transpile", "workers", |message| async move {
//!         println!("job of {} bytes", message.body.len());
//!         Ok(())
//!     })
//!     .await?;
//! queue.publish("transpile", "submission-42").await?;
//! queue.close().await;
//! # Ok(())
//! # }
//! ```

use crate::nsq::{handler_fn, HandlerResult, NsqConfig, NsqConnector, NsqMessage, NsqResult, NsqService};
use std::future::Future;

/// Publish/subscribe façade backed by NSQ
pub struct QueueService<C: NsqConnector> {
    nsq: NsqService<C>,
}

impl<C: NsqConnector> QueueService<C> {
    pub fn new(config: NsqConfig, connector: C) -> NsqResult<Self> {
        Ok(Self {
            nsq: NsqService::new(config, connector)?,
        })
    }

    /// Wrap an existing NSQ service
    pub fn from_service(nsq: NsqService<C>) -> Self {
        Self { nsq }
    }

    /// The underlying NSQ service
    pub fn nsq(&self) -> &NsqService<C> {
        &self.nsq
    }

    pub async fn publish(&self, topic: &str, body: impl Into<Vec<u8>>) -> NsqResult<()> {
        self.nsq.publish(topic, body).await
    }

    /// Run `f` for every non-empty message on `topic`/`channel`
    ///
    /// An `Err` from `f` requeues the message.
    pub async fn add_handler<F, Fut>(&self, topic: &str, channel: &str, f: F) -> NsqResult<()>
    where
        F: Fn(NsqMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.nsq.register_handler(topic, channel, handler_fn(f)).await
    }

    /// Stop all handlers and the producer
    pub async fn close(&self) {
        self.nsq.shutdown().await;
    }
}

#[cfg(feature = "nsq")]
impl QueueService<crate::nsq::TokioNsqConnector> {
    pub fn connect(config: NsqConfig) -> NsqResult<Self> {
        NsqService::connect(config).map(Self::from_service)
    }
}
