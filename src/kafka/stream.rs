//! MessageStream - payloads from one consume call
//!
//! A background pump owns the reader, reads messages one at a time and pushes
//! their payloads into a bounded channel. The caller side is a
//! [`MessageStream`], usable directly (`recv`) or as a `futures::Stream`.
//!
//! Read errors are logged and retried with exponential backoff. Once the
//! backoff policy is exhausted the pump closes the reader and the channel; the
//! terminal error is then available from [`MessageStream::close`].

use crate::core::retry::RetryPolicy;
use crate::core::shutdown::ShutdownCoordinator;
use crate::kafka::{KafkaError, KafkaResult, TopicReader};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Caller side of a running consume pump
///
/// Dropping the stream stops the pump.
pub struct MessageStream {
    topic: String,
    receiver: mpsc::Receiver<Vec<u8>>,
    shutdown: ShutdownCoordinator,
    pump: Option<JoinHandle<KafkaResult<()>>>,
}

impl MessageStream {
    pub(crate) fn spawn(
        topic: String,
        reader: Box<dyn TopicReader>,
        buffer: usize,
        backoff: RetryPolicy,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let shutdown = ShutdownCoordinator::new();
        let shutdown_rx = shutdown.subscribe();

        let pump = Pump {
            topic: topic.clone(),
            reader,
            sender,
            shutdown: shutdown.clone(),
            shutdown_rx,
            backoff,
        };

        Self {
            topic,
            receiver,
            shutdown,
            pump: Some(tokio::spawn(pump.run())),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next payload
    ///
    /// Returns `None` once the pump has exited, after `stop` or after the
    /// read backoff gave up.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }

    /// Ask the pump to exit at its next suspension point
    pub fn stop(&self) {
        self.shutdown.trigger_shutdown();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    /// Stop the pump, wait for it to release the reader, and report how it ended
    ///
    /// Returns the terminal read error if the pump gave up on its own, `Ok`
    /// if it was stopped.
    pub async fn close(mut self) -> KafkaResult<()> {
        self.stop();
        self.receiver.close();

        match self.pump.take() {
            Some(handle) => handle.await.map_err(|e| KafkaError::Internal {
                message: format!("consume pump for topic '{}' failed: {}", self.topic, e),
            })?,
            None => Ok(()),
        }
    }
}

impl Stream for MessageStream {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.shutdown.trigger_shutdown();
    }
}

struct Pump {
    topic: String,
    reader: Box<dyn TopicReader>,
    sender: mpsc::Sender<Vec<u8>>,
    shutdown: ShutdownCoordinator,
    shutdown_rx: broadcast::Receiver<()>,
    backoff: RetryPolicy,
}

impl Pump {
    async fn run(mut self) -> KafkaResult<()> {
        let result = self.pump_messages().await;

        if let Err(e) = self.reader.close().await {
            log::warn!("Failed to close kafka reader for topic '{}': {}", self.topic, e);
        }
        log::debug!("Kafka consume pump for topic '{}' exited", self.topic);

        result
    }

    async fn pump_messages(&mut self) -> KafkaResult<()> {
        let Self {
            topic,
            reader,
            sender,
            shutdown,
            shutdown_rx,
            backoff,
        } = self;
        let mut failures = 0usize;

        loop {
            let read = tokio::select! {
                biased;
                _ = shutdown.wait(shutdown_rx) => return Ok(()),
                read = reader.read() => read,
            };

            match read {
                Ok(payload) => {
                    failures = 0;
                    tokio::select! {
                        biased;
                        _ = shutdown.wait(shutdown_rx) => return Ok(()),
                        sent = sender.send(payload) => {
                            if sent.is_err() {
                                // Receiver is gone, nobody left to deliver to
                                return Ok(());
                            }
                        }
                    }
                }
                Err(error) => {
                    failures += 1;
                    if backoff.is_exhausted(failures) {
                        log::error!(
                            "Giving up on topic '{}' after {} consecutive read failures: {}",
                            topic,
                            failures,
                            error
                        );
                        return Err(KafkaError::ReadExhausted {
                            topic: topic.clone(),
                            attempts: failures,
                            source: Box::new(error),
                        });
                    }

                    let delay = backoff.delay_for_attempt(failures);
                    log::error!(
                        "Error reading message from topic '{}' (failure {}/{}), retrying in {:?}: {}",
                        topic,
                        failures,
                        backoff.max_attempts,
                        delay,
                        error
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.wait(shutdown_rx) => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
