//! In-memory nsqd
//!
//! Topics fan messages out to every channel; a topic without channels buffers
//! messages until its first channel subscribes. Finished and requeued
//! deliveries are recorded so tests can assert on acknowledgements.

use crate::core::sync::lock_or_err;
use crate::nsq::{
    Delivery, MessageSource, NsqConnector, NsqError, NsqMessage, NsqProducer, NsqResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

#[derive(Default)]
struct TopicState {
    backlog: VecDeque<NsqMessage>,
    channels: HashMap<String, VecDeque<NsqMessage>>,
}

#[derive(Default)]
struct NsqState {
    topics: HashMap<String, TopicState>,
    published: usize,
    finished: Vec<NsqMessage>,
    requeued: usize,
    producer_endpoints: Vec<String>,
    stopped_producers: usize,
    lookupd_connections: Vec<String>,
    unreachable_lookupd: HashSet<String>,
    stopped_sources: usize,
}

#[derive(Default)]
struct NsqInner {
    state: Mutex<NsqState>,
    queued: Notify,
}

/// Shared handle to an in-memory nsqd; clones see the same topics
#[derive(Clone, Default)]
pub struct InMemoryNsq {
    inner: Arc<NsqInner>,
}

impl InMemoryNsq {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> NsqResult<MutexGuard<'_, NsqState>> {
        lock_or_err(self.inner.state.lock(), "in-memory nsqd", |message| {
            NsqError::Internal { message }
        })
    }

    fn with_state<T: Default>(&self, f: impl FnOnce(&mut NsqState) -> T) -> T {
        self.state().map(|mut state| f(&mut state)).unwrap_or_default()
    }

    /// Enqueue `body` on `topic` as any producer would
    pub fn enqueue(&self, topic: &str, body: impl Into<Vec<u8>>) -> NsqResult<()> {
        let message = NsqMessage {
            body: body.into(),
            attempts: 1,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
        };
        {
            let mut state = self.state()?;
            state.published += 1;
            let topic = state.topics.entry(topic.to_string()).or_default();
            if topic.channels.is_empty() {
                topic.backlog.push_back(message);
            } else {
                for queue in topic.channels.values_mut() {
                    queue.push_back(message.clone());
                }
            }
        }
        self.inner.queued.notify_waiters();
        Ok(())
    }

    /// Make subscriptions through `endpoint` fail as if lookupd were down
    pub fn make_lookupd_unreachable(&self, endpoint: &str) {
        self.with_state(|state| {
            state.unreachable_lookupd.insert(endpoint.to_string());
        });
    }

    pub fn published_count(&self) -> usize {
        self.with_state(|state| state.published)
    }

    /// Messages acknowledged by consumers, in finish order
    pub fn finished(&self) -> Vec<NsqMessage> {
        self.with_state(|state| state.finished.clone())
    }

    pub fn finished_count(&self) -> usize {
        self.with_state(|state| state.finished.len())
    }

    pub fn requeued_count(&self) -> usize {
        self.with_state(|state| state.requeued)
    }

    /// Messages waiting on `topic`/`channel`
    pub fn pending(&self, topic: &str, channel: &str) -> usize {
        self.with_state(|state| {
            state
                .topics
                .get(topic)
                .and_then(|t| t.channels.get(channel))
                .map_or(0, VecDeque::len)
        })
    }

    pub fn producer_endpoints(&self) -> Vec<String> {
        self.with_state(|state| state.producer_endpoints.clone())
    }

    pub fn stopped_producers(&self) -> usize {
        self.with_state(|state| state.stopped_producers)
    }

    /// Lookupd endpoints consumers subscribed through, one entry per subscription
    pub fn lookupd_connections(&self) -> Vec<String> {
        self.with_state(|state| state.lookupd_connections.clone())
    }

    pub fn stopped_sources(&self) -> usize {
        self.with_state(|state| state.stopped_sources)
    }

    fn pop(&self, topic: &str, channel: &str) -> NsqResult<Option<NsqMessage>> {
        let mut state = self.state()?;
        Ok(state
            .topics
            .get_mut(topic)
            .and_then(|t| t.channels.get_mut(channel))
            .and_then(VecDeque::pop_front))
    }
}

#[async_trait]
impl NsqConnector for InMemoryNsq {
    fn producer(&self, nsqd_endpoint: &str) -> NsqResult<Arc<dyn NsqProducer>> {
        self.state()?
            .producer_endpoints
            .push(nsqd_endpoint.to_string());
        Ok(Arc::new(MemoryProducer {
            nsq: self.clone(),
            stopped: Mutex::new(false),
        }))
    }

    async fn subscribe(
        &self,
        topic: &str,
        channel: &str,
        lookupd_endpoint: &str,
        _max_in_flight: usize,
    ) -> NsqResult<Box<dyn MessageSource>> {
        {
            let mut state = self.state()?;
            if state.unreachable_lookupd.contains(lookupd_endpoint) {
                return Err(NsqError::Connect {
                    topic: topic.to_string(),
                    channel: channel.to_string(),
                    endpoint: lookupd_endpoint.to_string(),
                    message: "connection refused".to_string(),
                });
            }
            state.lookupd_connections.push(lookupd_endpoint.to_string());

            let topic_state = state.topics.entry(topic.to_string()).or_default();
            if !topic_state.channels.contains_key(channel) {
                let first_channel = topic_state.channels.is_empty();
                let mut queue = VecDeque::new();
                if first_channel {
                    queue.extend(topic_state.backlog.drain(..));
                }
                topic_state.channels.insert(channel.to_string(), queue);
            }
        }

        Ok(Box::new(MemorySource {
            nsq: self.clone(),
            topic: topic.to_string(),
            channel: channel.to_string(),
            stopped: false,
        }))
    }
}

struct MemoryProducer {
    nsq: InMemoryNsq,
    stopped: Mutex<bool>,
}

#[async_trait]
impl NsqProducer for MemoryProducer {
    async fn publish(&self, topic: &str, body: Vec<u8>) -> NsqResult<()> {
        let stopped = *lock_or_err(self.stopped.lock(), "producer state", |message| {
            NsqError::Internal { message }
        })?;
        if stopped {
            return Err(NsqError::Publish {
                topic: topic.to_string(),
                message: "producer is stopped".to_string(),
            });
        }
        self.nsq.enqueue(topic, body)
    }

    async fn stop(&self) {
        if let Ok(mut stopped) = self.stopped.lock() {
            if !*stopped {
                *stopped = true;
                self.nsq.with_state(|state| state.stopped_producers += 1);
            }
        }
    }
}

struct MemorySource {
    nsq: InMemoryNsq,
    topic: String,
    channel: String,
    stopped: bool,
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn next(&mut self) -> Option<Box<dyn Delivery>> {
        loop {
            if self.stopped {
                return None;
            }
            let queued = self.nsq.inner.queued.notified();
            match self.nsq.pop(&self.topic, &self.channel) {
                Ok(Some(message)) => {
                    return Some(Box::new(MemoryDelivery {
                        nsq: self.nsq.clone(),
                        topic: self.topic.clone(),
                        channel: self.channel.clone(),
                        message,
                    }))
                }
                Ok(None) => queued.await,
                Err(e) => {
                    log::error!("In-memory nsqd unavailable: {}", e);
                    return None;
                }
            }
        }
    }

    async fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.nsq.with_state(|state| state.stopped_sources += 1);
        }
    }
}

struct MemoryDelivery {
    nsq: InMemoryNsq,
    topic: String,
    channel: String,
    message: NsqMessage,
}

#[async_trait]
impl Delivery for MemoryDelivery {
    fn message(&self) -> &NsqMessage {
        &self.message
    }

    async fn finish(self: Box<Self>) {
        let MemoryDelivery { nsq, message, .. } = *self;
        nsq.with_state(|state| state.finished.push(message));
    }

    async fn requeue(self: Box<Self>) {
        let MemoryDelivery {
            nsq,
            topic,
            channel,
            mut message,
        } = *self;
        message.attempts = message.attempts.saturating_add(1);

        nsq.with_state(|state| {
            state.requeued += 1;
            if let Some(queue) = state
                .topics
                .get_mut(&topic)
                .and_then(|t| t.channels.get_mut(&channel))
            {
                queue.push_back(message);
            }
        });
        nsq.inner.queued.notify_waiters();
    }
}
