//! S3Service - bucket-scoped object operations

use crate::storage::{
    ObjectStoreClient, ObjectStream, ObjectTags, S3Config, StorageError, StorageResult,
    StoredObject, UploadInfo,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Prefixes a submission's sources and results are stored under
pub const SUBMISSION_PREFIXES: [&str; 2] = ["transpilations/", "transpilations-results/"];

/// Upper bound on the upload buffer reserved ahead of reading
const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// Object storage client bound to the configured bucket
///
/// Bulk operations (`remove_objects`, `size_of`, `schedule_for_deletion`)
/// walk the listing sequentially and stop at the first error; objects
/// processed before the error stay processed.
pub struct S3Service<C: ObjectStoreClient> {
    config: S3Config,
    client: C,
}

impl<C: ObjectStoreClient> S3Service<C> {
    pub fn new(config: S3Config, client: C) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create bucket `name` unless it already exists
    pub async fn ensure_bucket(&self, name: &str) -> StorageResult<()> {
        if self.client.bucket_exists(name).await? {
            log::debug!("Bucket {} already exists", name);
            return Ok(());
        }

        self.client.make_bucket(name).await?;
        log::info!("Created bucket {}", name);
        Ok(())
    }

    /// Upload exactly `size` bytes from `reader` to `path`
    pub async fn put_object<R>(&self, path: &str, reader: R, size: u64) -> StorageResult<UploadInfo>
    where
        R: AsyncRead + Unpin + Send,
    {
        // The declared size is untrusted; grow with the data actually read
        let capacity = usize::try_from(size.min(MAX_PREALLOCATION)).unwrap_or_default();
        let mut data = Vec::with_capacity(capacity);
        reader
            .take(size)
            .read_to_end(&mut data)
            .await
            .map_err(|source| StorageError::Io {
                path: path.to_string(),
                source,
            })?;

        let actual = data.len() as u64;
        if actual != size {
            return Err(StorageError::ShortRead {
                path: path.to_string(),
                expected: size,
                actual,
            });
        }

        self.client
            .put_object(&self.config.bucket, path, data.into())
            .await
    }

    pub async fn get_object(&self, path: &str) -> StorageResult<StoredObject> {
        self.client.get_object(&self.config.bucket, path).await
    }

    pub async fn remove_object(&self, path: &str) -> StorageResult<()> {
        self.client.remove_object(&self.config.bucket, path).await
    }

    /// Recursively list every object under `prefix`
    pub fn list_objects(&self, prefix: &str) -> ObjectStream {
        self.client.list_objects(&self.config.bucket, prefix)
    }

    /// Remove every object under `prefix`
    pub async fn remove_objects(&self, prefix: &str) -> StorageResult<()> {
        let mut objects = self.list_objects(prefix);
        while let Some(object) = objects.try_next().await? {
            log::debug!("Removing object {}", object.path);
            self.remove_object(&object.path).await?;
        }
        Ok(())
    }

    /// Total size in bytes of the objects under `prefix`
    pub async fn size_of(&self, prefix: &str) -> StorageResult<u64> {
        self.list_objects(prefix)
            .try_fold(0u64, |total, object| async move {
                Ok::<_, StorageError>(total.saturating_add(object.size))
            })
            .await
    }

    /// Tag every object under `prefix` for removal by the bucket lifecycle rule
    pub async fn schedule_for_deletion(&self, prefix: &str) -> StorageResult<()> {
        let tags = ObjectTags::to_delete();
        let mut objects = self.list_objects(prefix);
        while let Some(object) = objects.try_next().await? {
            log::debug!("Setting tags {:?} on object {}", tags, object.path);
            self.client
                .put_object_tagging(&self.config.bucket, &object.path, &tags)
                .await?;
        }
        Ok(())
    }

    /// Objects belonging to submission `id`, sources first
    pub fn list_submission_files(&self, id: &str) -> ObjectStream {
        let listings: Vec<ObjectStream> = SUBMISSION_PREFIXES
            .iter()
            .map(|prefix| self.list_objects(&format!("{}{}", prefix, id)))
            .collect();
        Box::pin(stream::iter(listings).flatten())
    }

    /// Remove every object of submission `id`, then its bare key under each prefix
    pub async fn delete_submission(&self, id: &str) -> StorageResult<()> {
        log::debug!("Deleting submission {} from object storage", id);
        for prefix in SUBMISSION_PREFIXES {
            let key = format!("{}{}", prefix, id);
            self.remove_objects(&key).await?;
            self.remove_object(&key).await?;
        }
        Ok(())
    }

    pub async fn schedule_submission_for_deletion(&self, id: &str) -> StorageResult<()> {
        for prefix in SUBMISSION_PREFIXES {
            self.schedule_for_deletion(&format!("{}{}", prefix, id))
                .await?;
        }
        Ok(())
    }
}

#[cfg(feature = "s3")]
impl S3Service<crate::storage::RustS3Client> {
    /// Create a service talking to the configured endpoint through rust-s3
    pub fn connect(config: S3Config) -> StorageResult<Self> {
        config.validate()?;
        let client = crate::storage::RustS3Client::new(&config)?;
        Self::new(config, client)
    }
}
