//! NSQ client seams
//!
//! [`NsqService`](crate::nsq::NsqService) owns the worker pools and the
//! consumer list; the connector only provides a producer and raw message
//! sources, so the dispatch rules stay the same for every client library.

use crate::nsq::{NsqMessage, NsqResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Publishes messages to nsqd
#[async_trait]
pub trait NsqProducer: Send + Sync {
    /// Publish `body` to `topic`, waiting for nsqd to acknowledge it
    async fn publish(&self, topic: &str, body: Vec<u8>) -> NsqResult<()>;

    /// Close the producer connection; later publishes fail
    async fn stop(&self);
}

/// An in-flight message that must be finished or requeued
#[async_trait]
pub trait Delivery: Send {
    fn message(&self) -> &NsqMessage;

    /// Acknowledge the message (FIN)
    async fn finish(self: Box<Self>);

    /// Hand the message back to nsqd for redelivery (REQ)
    async fn requeue(self: Box<Self>);
}

/// Stream of deliveries for one topic/channel subscription
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next delivery; `None` once the source is stopped
    async fn next(&mut self) -> Option<Box<dyn Delivery>>;

    /// Disconnect; must be safe to call more than once
    async fn stop(&mut self);
}

/// Factory for producers and subscriptions
#[async_trait]
pub trait NsqConnector: Send + Sync + 'static {
    fn producer(&self, nsqd_endpoint: &str) -> NsqResult<Arc<dyn NsqProducer>>;

    /// Subscribe to `topic`/`channel`, discovering nsqd nodes through lookupd
    async fn subscribe(
        &self,
        topic: &str,
        channel: &str,
        lookupd_endpoint: &str,
        max_in_flight: usize,
    ) -> NsqResult<Box<dyn MessageSource>>;
}
