//! Object Storage Client
//!
//! Bucket-scoped access to an S3-compatible store: uploads, downloads,
//! recursive listings, prefix-wide removal and sizing, and lifecycle tagging.
//!
//! Listings are lazy streams of `StorageResult<ObjectInfo>`; a failure while
//! listing arrives as an `Err` item instead of ending the stream silently.
//!
//! # Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use tereus_std::storage::{InMemoryObjectStore, S3Config, S3Service};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = S3Config::new("localhost:9000", "minio", "minio123", "artifacts", false);
//! let storage = S3Service::new(config, InMemoryObjectStore::new())?;
//! storage.ensure_bucket("artifacts").await?;
//!
//! let body: &[u8] = b"fn main() {}";
//! storage.put_object("transpilations/42/main.rs", body, 12).await?;
//!
//! let files: Vec<_> = storage.list_submission_files("42").try_collect().await?;
//! assert_eq!(files.len(), 1);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod memory;
#[cfg(feature = "s3")]
mod rust_s3;
mod service;
mod types;

pub use client::ObjectStoreClient;
pub use config::S3Config;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryObjectStore;
#[cfg(feature = "s3")]
pub use rust_s3::RustS3Client;
pub use service::{S3Service, SUBMISSION_PREFIXES};
pub use types::{ObjectInfo, ObjectStream, ObjectTags, StoredObject, UploadInfo};

#[cfg(test)]
mod tests;
