//! Values exchanged with the object store

use crate::storage::StorageResult;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub path: String,
    pub size: u64,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub bucket: String,
    pub path: String,
    pub size: u64,
    pub etag: String,
}

/// Lazy recursive listing; a failed item is yielded inline as `Err`
pub type ObjectStream = BoxStream<'static, StorageResult<ObjectInfo>>;

/// A downloaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    path: String,
    data: Bytes,
}

impl StoredObject {
    pub fn new(path: impl Into<String>, data: Bytes) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Read the contents through `tokio::io::AsyncRead`
    pub fn into_reader(self) -> Cursor<Bytes> {
        Cursor::new(self.data)
    }
}

/// Ordered object tag set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTags(Vec<(String, String)>);

impl ObjectTags {
    pub const TO_DELETE_KEY: &'static str = "to-delete";

    pub fn new() -> Self {
        Self::default()
    }

    /// The `to-delete=true` tag matched by the bucket's lifecycle rule
    pub fn to_delete() -> Self {
        let mut tags = Self::new();
        tags.insert(Self::TO_DELETE_KEY, "true");
        tags
    }

    /// Set `key` to `value`, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
