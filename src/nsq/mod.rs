//! NSQ Queue Client
//!
//! Publishes to a single nsqd and runs handler pools for topic/channel
//! subscriptions discovered through nsqlookupd.
//!
//! # Message dispatch
//!
//! Each registration starts one worker per unit of concurrency. For every
//! delivery a worker:
//!
//! 1. finishes empty messages without calling the handler
//! 2. calls the handler
//! 3. finishes the message on success, requeues it on error
//!
//! # Example
//!
//! ```rust
//! use tereus_std::nsq::{handler_fn, InMemoryNsq, NsqConfig, NsqService};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NsqConfig::new("127.0.0.1:4150", "127.0.0.1:4161");
//! let service = NsqService::new(config, InMemoryNsq::new())?;
//!
//! service
//!     .register_handler("events", "audit", handler_fn(|message| async move {
//!         println!("{} bytes", message.body.len());
//!         Ok(())
//!     }))
//!     .await?;
//! service.publish("events", b"hello".to_vec()).await?;
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod consumer;
mod error;
mod memory;
mod message;
pub mod names;
#[cfg(feature = "nsq")]
mod nsqd;
mod service;
mod traits;

pub use config::NsqConfig;
pub use consumer::ConsumerHandle;
pub use error::{NsqError, NsqResult};
pub use memory::InMemoryNsq;
pub use message::{handler_fn, HandlerError, HandlerFn, HandlerResult, MessageHandler, NsqMessage};
#[cfg(feature = "nsq")]
pub use nsqd::TokioNsqConnector;
pub use service::NsqService;
pub use traits::{Delivery, MessageSource, NsqConnector, NsqProducer};

#[cfg(test)]
mod tests;
