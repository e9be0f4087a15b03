//! ConsumerHandle - one topic/channel registration and its handler pool

use crate::core::shutdown::ShutdownCoordinator;
use crate::nsq::{Delivery, MessageHandler, MessageSource};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

type SharedSource = Arc<AsyncMutex<Box<dyn MessageSource>>>;

/// A registered consumer
///
/// Owns `concurrency` worker tasks that take turns pulling from the shared
/// message source and run the handler in parallel.
pub struct ConsumerHandle {
    topic: String,
    channel: String,
    concurrency: usize,
    source: SharedSource,
    shutdown: ShutdownCoordinator,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ConsumerHandle {
    pub(crate) fn start(
        topic: &str,
        channel: &str,
        source: Box<dyn MessageSource>,
        handler: Arc<dyn MessageHandler>,
        concurrency: usize,
    ) -> Self {
        let source: SharedSource = Arc::new(AsyncMutex::new(source));
        let shutdown = ShutdownCoordinator::new();
        let label = format!("{}/{}", topic, channel);

        let workers = (0..concurrency)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    label: label.clone(),
                    source: Arc::clone(&source),
                    handler: Arc::clone(&handler),
                    shutdown: shutdown.clone(),
                    shutdown_rx: shutdown.subscribe(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            topic: topic.to_string(),
            channel: channel.to_string(),
            concurrency,
            source,
            shutdown,
            workers: Mutex::new(workers),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    /// Stop the workers, wait for in-flight handlers, then disconnect
    pub async fn stop(&self) {
        self.shutdown.trigger_shutdown();

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(e) => {
                log::error!(
                    "Worker list for {}/{} poisoned, not waiting for workers: {}",
                    self.topic,
                    self.channel,
                    e
                );
                Vec::new()
            }
        };
        for worker in workers {
            if let Err(e) = worker.await {
                log::warn!(
                    "Handler worker for {}/{} ended abnormally: {}",
                    self.topic,
                    self.channel,
                    e
                );
            }
        }

        self.source.lock().await.stop().await;
        log::debug!("Stopped NSQ consumer {}/{}", self.topic, self.channel);
    }
}

struct Worker {
    worker_id: usize,
    label: String,
    source: SharedSource,
    handler: Arc<dyn MessageHandler>,
    shutdown: ShutdownCoordinator,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let delivery = {
                let mut source = tokio::select! {
                    biased;
                    _ = self.shutdown.wait(&mut self.shutdown_rx) => break,
                    source = self.source.lock() => source,
                };
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait(&mut self.shutdown_rx) => break,
                    delivery = source.next() => delivery,
                }
            };

            match delivery {
                Some(delivery) => dispatch(&self.label, self.handler.as_ref(), delivery).await,
                None => {
                    log::debug!(
                        "Message source for {} closed, worker {} exiting",
                        self.label,
                        self.worker_id
                    );
                    break;
                }
            }
        }
    }
}

async fn dispatch(label: &str, handler: &dyn MessageHandler, delivery: Box<dyn Delivery>) {
    if delivery.message().body.is_empty() {
        // Empty bodies carry no work; finishing stops nsqd redelivering them
        delivery.finish().await;
        return;
    }

    let outcome = handler.handle_message(delivery.message()).await;
    match outcome {
        Ok(()) => delivery.finish().await,
        Err(e) => {
            log::warn!(
                "Handler for {} failed on attempt {}, requeueing: {}",
                label,
                delivery.message().attempts,
                e
            );
            delivery.requeue().await;
        }
    }
}
