//! Test modules for the object storage client

mod objects;

use crate::storage::{InMemoryObjectStore, S3Config, S3Service};

pub(super) const BUCKET: &str = "artifacts";

/// A service over a fresh store that already has the configured bucket
pub(super) fn service() -> (S3Service<InMemoryObjectStore>, InMemoryObjectStore) {
    let store = InMemoryObjectStore::new();
    store.create_bucket(BUCKET);
    let config = S3Config::new("localhost:9000", "minio", "minio123", BUCKET, false);
    (S3Service::new(config, store.clone()).unwrap(), store)
}
