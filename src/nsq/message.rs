//! NSQ messages and handlers

use async_trait::async_trait;
use std::future::Future;

/// A message delivered to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsqMessage {
    pub body: Vec<u8>,
    /// Delivery attempt, starting at 1
    pub attempts: u16,
    /// Publish time in nanoseconds since the Unix epoch
    pub timestamp: u64,
}

impl NsqMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            attempts: 1,
            timestamp: 0,
        }
    }
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of handling a message: `Ok` finishes it, `Err` requeues it
pub type HandlerResult = Result<(), HandlerError>;

/// Processes messages for one topic/channel registration
///
/// Invoked concurrently from the consumer's worker pool, so implementations
/// must tolerate parallel calls.
///
/// ```rust
/// use tereus_std::nsq::{HandlerResult, MessageHandler, NsqMessage};
///
/// struct Printer;
///
/// #[async_trait::async_trait]
/// impl MessageHandler for Printer {
///     async fn handle_message(&self, message: &NsqMessage) -> HandlerResult {
///         println!("{} bytes", message.body.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle_message(&self, message: &NsqMessage) -> HandlerResult;
}

/// Adapter turning an async closure into a [`MessageHandler`]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap `f` as a [`MessageHandler`]; the closure receives its own copy of the message
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(NsqMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(NsqMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle_message(&self, message: &NsqMessage) -> HandlerResult {
        (self.f)(message.clone()).await
    }
}
