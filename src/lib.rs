//! Shared service plumbing: Kafka topics, NSQ queues, S3-compatible object
//! storage and logging bootstrap.
//!
//! Every client library sits behind a trait. In-memory implementations are
//! always available; network implementations are enabled with the `kafka`,
//! `nsq` and `s3` features.

pub mod core;
pub mod kafka;
pub mod logging;
pub mod nsq;
pub mod queue;
pub mod storage;
