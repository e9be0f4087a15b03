//! Object store client seam

use crate::storage::{ObjectStream, ObjectTags, StorageResult, StoredObject, UploadInfo};
use async_trait::async_trait;
use bytes::Bytes;

/// Operations [`S3Service`](crate::storage::S3Service) needs from an
/// S3-compatible store
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()>;

    async fn put_object(&self, bucket: &str, path: &str, data: Bytes)
        -> StorageResult<UploadInfo>;

    async fn get_object(&self, bucket: &str, path: &str) -> StorageResult<StoredObject>;

    /// Remove `path`; removing a missing object succeeds
    async fn remove_object(&self, bucket: &str, path: &str) -> StorageResult<()>;

    /// Recursively list objects under `prefix`, fetching pages as the stream is polled
    fn list_objects(&self, bucket: &str, prefix: &str) -> ObjectStream;

    /// Replace the tag set of `path`
    async fn put_object_tagging(
        &self,
        bucket: &str,
        path: &str,
        tags: &ObjectTags,
    ) -> StorageResult<()>;
}
