//! In-memory object store
//!
//! Buckets hold objects in key order, so listings come back sorted like S3's.
//! Fault injection covers every failure path [`S3Service`] handles.
//!
//! [`S3Service`]: crate::storage::S3Service

use crate::core::sync::lock_or_err;
use crate::storage::{
    ObjectInfo, ObjectStoreClient, ObjectStream, ObjectTags, StorageError, StorageResult,
    StoredObject, UploadInfo,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct StoredEntry {
    data: Bytes,
    tags: ObjectTags,
}

#[derive(Default)]
struct Faults {
    bucket_exists: bool,
    make_bucket: bool,
    listing_at: Option<usize>,
    tagging: HashSet<String>,
    removal: HashSet<String>,
}

#[derive(Default)]
struct StoreState {
    buckets: HashMap<String, BTreeMap<String, StoredEntry>>,
    faults: Faults,
    removed: Vec<String>,
    tagged: Vec<String>,
    buckets_made: usize,
}

/// Shared in-memory store; clones see the same buckets
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    state: Arc<Mutex<StoreState>>,
}

fn etag(data: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StorageResult<MutexGuard<'_, StoreState>> {
        lock_or_err(self.state.lock(), "in-memory object store", |message| {
            StorageError::Internal { message }
        })
    }

    fn with_state<T: Default>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        self.state().map(|mut state| f(&mut state)).unwrap_or_default()
    }

    /// Create `bucket` if needed and store `data` at `path`
    pub fn insert(&self, bucket: &str, path: &str, data: impl Into<Bytes>) {
        self.with_state(|state| {
            state.buckets.entry(bucket.to_string()).or_default().insert(
                path.to_string(),
                StoredEntry {
                    data: data.into(),
                    tags: ObjectTags::new(),
                },
            );
        });
    }

    /// Create an empty bucket
    pub fn create_bucket(&self, bucket: &str) {
        self.with_state(|state| {
            state.buckets.entry(bucket.to_string()).or_default();
        });
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.with_state(|state| state.buckets.contains_key(bucket))
    }

    /// Keys currently stored in `bucket`, sorted
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        self.with_state(|state| {
            state
                .buckets
                .get(bucket)
                .map(|objects| objects.keys().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn object_tags(&self, bucket: &str, path: &str) -> Option<ObjectTags> {
        self.with_state(|state| {
            state
                .buckets
                .get(bucket)
                .and_then(|objects| objects.get(path))
                .map(|entry| entry.tags.clone())
        })
    }

    /// Every path passed to `remove_object`, in call order
    pub fn removed(&self) -> Vec<String> {
        self.with_state(|state| state.removed.clone())
    }

    /// Every path successfully tagged, in call order
    pub fn tagged(&self) -> Vec<String> {
        self.with_state(|state| state.tagged.clone())
    }

    pub fn buckets_made(&self) -> usize {
        self.with_state(|state| state.buckets_made)
    }

    pub fn fail_bucket_exists(&self) {
        self.with_state(|state| state.faults.bucket_exists = true);
    }

    pub fn fail_make_bucket(&self) {
        self.with_state(|state| state.faults.make_bucket = true);
    }

    /// Make every listing end with an error after yielding at most `index` objects
    pub fn fail_listing_at(&self, index: usize) {
        self.with_state(|state| state.faults.listing_at = Some(index));
    }

    pub fn fail_tagging(&self, path: &str) {
        self.with_state(|state| {
            state.faults.tagging.insert(path.to_string());
        });
    }

    pub fn fail_removal(&self, path: &str) {
        self.with_state(|state| {
            state.faults.removal.insert(path.to_string());
        });
    }
}

fn no_such_bucket(bucket: &str, operation: &'static str) -> StorageError {
    StorageError::Bucket {
        bucket: bucket.to_string(),
        operation,
        message: "NoSuchBucket".to_string(),
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let state = self.state()?;
        if state.faults.bucket_exists {
            return Err(StorageError::Bucket {
                bucket: bucket.to_string(),
                operation: "existence check",
                message: "connection refused".to_string(),
            });
        }
        Ok(state.buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.state()?;
        if state.faults.make_bucket {
            return Err(StorageError::Bucket {
                bucket: bucket.to_string(),
                operation: "create",
                message: "AccessDenied".to_string(),
            });
        }
        if state.buckets.contains_key(bucket) {
            return Err(StorageError::Bucket {
                bucket: bucket.to_string(),
                operation: "create",
                message: "BucketAlreadyOwnedByYou".to_string(),
            });
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        state.buckets_made += 1;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
    ) -> StorageResult<UploadInfo> {
        let mut state = self.state()?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket, "upload"))?;

        let info = UploadInfo {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: data.len() as u64,
            etag: etag(&data),
        };
        objects.insert(
            path.to_string(),
            StoredEntry {
                data,
                tags: ObjectTags::new(),
            },
        );
        Ok(info)
    }

    async fn get_object(&self, bucket: &str, path: &str) -> StorageResult<StoredObject> {
        let state = self.state()?;
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket, "download"))?;
        objects
            .get(path)
            .map(|entry| StoredObject::new(path, entry.data.clone()))
            .ok_or_else(|| StorageError::Object {
                path: path.to_string(),
                operation: "download",
                message: "NoSuchKey".to_string(),
            })
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> StorageResult<()> {
        let mut state = self.state()?;
        state.removed.push(path.to_string());
        if state.faults.removal.contains(path) {
            return Err(StorageError::Object {
                path: path.to_string(),
                operation: "remove",
                message: "AccessDenied".to_string(),
            });
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket, "remove"))?;
        objects.remove(path);
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> ObjectStream {
        let listing: Vec<StorageResult<ObjectInfo>> = match self.state() {
            Ok(state) => {
                let mut items: Vec<StorageResult<ObjectInfo>> = state
                    .buckets
                    .get(bucket)
                    .into_iter()
                    .flat_map(|objects| objects.range(prefix.to_string()..))
                    .take_while(|(path, _)| path.starts_with(prefix))
                    .map(|(path, entry)| {
                        Ok(ObjectInfo {
                            path: path.clone(),
                            size: entry.data.len() as u64,
                        })
                    })
                    .collect();
                if let Some(index) = state.faults.listing_at {
                    items.truncate(index);
                    items.push(Err(StorageError::Listing {
                        prefix: prefix.to_string(),
                        message: "InternalError".to_string(),
                    }));
                }
                items
            }
            Err(e) => vec![Err(e)],
        };
        Box::pin(stream::iter(listing))
    }

    async fn put_object_tagging(
        &self,
        bucket: &str,
        path: &str,
        tags: &ObjectTags,
    ) -> StorageResult<()> {
        let mut state = self.state()?;
        if state.faults.tagging.contains(path) {
            return Err(StorageError::Object {
                path: path.to_string(),
                operation: "tagging",
                message: "AccessDenied".to_string(),
            });
        }
        let entry = state
            .buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(path))
            .ok_or_else(|| StorageError::Object {
                path: path.to_string(),
                operation: "tagging",
                message: "NoSuchKey".to_string(),
            })?;
        entry.tags = tags.clone();
        state.tagged.push(path.to_string());
        Ok(())
    }
}
