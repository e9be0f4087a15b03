//! In-memory broker
//!
//! A process-local stand-in for a Kafka cluster: topics are append-only
//! vectors, consumer groups track a shared offset per topic, and readers
//! start from the end of the topic when their group has no offset yet.
//! Failures can be injected per topic to exercise error paths.

use crate::core::sync::lock_or_err;
use crate::kafka::{BrokerConnector, KafkaError, KafkaResult, TopicReader, TopicWriter};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// A message stored by the in-memory broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct BrokerState {
    topics: HashMap<String, Vec<Record>>,
    /// (group, topic) -> next offset to read
    group_offsets: HashMap<(String, String), usize>,
    writers_opened: usize,
    writers_closed: usize,
    readers_opened: usize,
    readers_closed: usize,
    read_failures: HashMap<String, usize>,
    failing_writes: HashSet<String>,
    failing_closes: HashSet<String>,
}

#[derive(Default)]
struct BrokerInner {
    state: Mutex<BrokerState>,
    appended: Notify,
}

/// Shared handle to an in-memory broker; clones see the same topics
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> KafkaResult<MutexGuard<'_, BrokerState>> {
        lock_or_err(self.inner.state.lock(), "in-memory broker", |message| {
            KafkaError::Internal { message }
        })
    }

    fn with_state<T: Default>(&self, f: impl FnOnce(&mut BrokerState) -> T) -> T {
        self.state().map(|mut state| f(&mut state)).unwrap_or_default()
    }

    /// Append a record as an external producer would
    pub fn produce(&self, topic: &str, key: &[u8], payload: &[u8]) -> KafkaResult<()> {
        {
            let mut state = self.state()?;
            state
                .topics
                .entry(topic.to_string())
                .or_default()
                .push(Record {
                    key: key.to_vec(),
                    payload: payload.to_vec(),
                });
        }
        self.inner.appended.notify_waiters();
        Ok(())
    }

    /// Snapshot of every record in `topic`
    pub fn records(&self, topic: &str) -> Vec<Record> {
        self.with_state(|state| state.topics.get(topic).cloned().unwrap_or_default())
    }

    pub fn writers_opened(&self) -> usize {
        self.with_state(|state| state.writers_opened)
    }

    pub fn writers_closed(&self) -> usize {
        self.with_state(|state| state.writers_closed)
    }

    pub fn readers_opened(&self) -> usize {
        self.with_state(|state| state.readers_opened)
    }

    pub fn readers_closed(&self) -> usize {
        self.with_state(|state| state.readers_closed)
    }

    /// Make the next `count` reads on `topic` fail
    pub fn fail_reads(&self, topic: &str, count: usize) {
        self.with_state(|state| {
            state.read_failures.insert(topic.to_string(), count);
        });
        // Wake readers parked on an empty topic so they observe the failure
        self.inner.appended.notify_waiters();
    }

    /// Make every write to `topic` fail
    pub fn fail_writes(&self, topic: &str) {
        self.with_state(|state| {
            state.failing_writes.insert(topic.to_string());
        });
    }

    /// Make closing writers or readers of `topic` fail
    pub fn fail_closes(&self, topic: &str) {
        self.with_state(|state| {
            state.failing_closes.insert(topic.to_string());
        });
    }
}

impl BrokerConnector for InMemoryBroker {
    fn open_writer(&self, topic: &str) -> KafkaResult<Arc<dyn TopicWriter>> {
        self.state()?.writers_opened += 1;
        Ok(Arc::new(MemoryTopicWriter {
            broker: self.clone(),
            topic: topic.to_string(),
            closed: AtomicBool::new(false),
        }))
    }

    fn open_reader(&self, topic: &str, group_id: &str) -> KafkaResult<Box<dyn TopicReader>> {
        {
            let mut guard = self.state()?;
            let state = &mut *guard;
            let end = state.topics.get(topic).map_or(0, Vec::len);
            state
                .group_offsets
                .entry((group_id.to_string(), topic.to_string()))
                .or_insert(end);
            state.readers_opened += 1;
        }
        Ok(Box::new(MemoryTopicReader {
            broker: self.clone(),
            topic: topic.to_string(),
            group_id: group_id.to_string(),
        }))
    }
}

struct MemoryTopicWriter {
    broker: InMemoryBroker,
    topic: String,
    closed: AtomicBool,
}

#[async_trait]
impl TopicWriter for MemoryTopicWriter {
    async fn write(&self, key: &[u8], payload: &[u8]) -> KafkaResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KafkaError::Write {
                topic: self.topic.clone(),
                message: "writer is closed".to_string(),
            });
        }
        if self.broker.state()?.failing_writes.contains(&self.topic) {
            return Err(KafkaError::Write {
                topic: self.topic.clone(),
                message: "injected write failure".to_string(),
            });
        }
        self.broker.produce(&self.topic, key, payload)
    }

    async fn close(&self) -> KafkaResult<()> {
        self.closed.store(true, Ordering::Release);
        let mut state = self.broker.state()?;
        state.writers_closed += 1;
        if state.failing_closes.contains(&self.topic) {
            return Err(KafkaError::Close {
                topic: self.topic.clone(),
                role: "writer",
                message: "injected close failure".to_string(),
            });
        }
        Ok(())
    }
}

struct MemoryTopicReader {
    broker: InMemoryBroker,
    topic: String,
    group_id: String,
}

impl MemoryTopicReader {
    /// Take the next record for this reader's group, if one is available
    fn poll_record(&self) -> KafkaResult<Option<Vec<u8>>> {
        let mut guard = self.broker.state()?;
        let state = &mut *guard;

        if let Some(remaining) = state.read_failures.get_mut(&self.topic) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(KafkaError::Read {
                    topic: self.topic.clone(),
                    message: "injected read failure".to_string(),
                });
            }
        }

        let records = match state.topics.get(&self.topic) {
            Some(records) => records,
            None => return Ok(None),
        };
        let offset = state
            .group_offsets
            .entry((self.group_id.clone(), self.topic.clone()))
            .or_insert(records.len());

        match records.get(*offset) {
            Some(record) => {
                *offset += 1;
                Ok(Some(record.payload.clone()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TopicReader for MemoryTopicReader {
    async fn read(&mut self) -> KafkaResult<Vec<u8>> {
        loop {
            // Register interest before checking so an append in between is not missed
            let appended = self.broker.inner.appended.notified();
            if let Some(payload) = self.poll_record()? {
                return Ok(payload);
            }
            appended.await;
        }
    }

    async fn close(&mut self) -> KafkaResult<()> {
        let mut state = self.broker.state()?;
        state.readers_closed += 1;
        if state.failing_closes.contains(&self.topic) {
            return Err(KafkaError::Close {
                topic: self.topic.clone(),
                role: "reader",
                message: "injected close failure".to_string(),
            });
        }
        Ok(())
    }
}
