//! rust-s3 backed client (feature `s3`)

use crate::storage::{
    ObjectInfo, ObjectStoreClient, ObjectStream, ObjectTags, S3Config, StorageError,
    StorageResult, StoredObject, UploadInfo,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, BucketConfiguration, Region};
use std::collections::VecDeque;

/// Talks to an S3-compatible endpoint through rust-s3
pub struct RustS3Client {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl RustS3Client {
    pub fn new(config: &S3Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Configuration {
            message: format!("invalid credentials: {}", e),
        })?;

        Ok(Self {
            region: Region::Custom {
                region: config.region.clone(),
                endpoint: config.endpoint_url(),
            },
            credentials,
            path_style: config.path_style,
        })
    }

    fn bucket(&self, name: &str) -> StorageResult<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone()).map_err(
            |e| StorageError::Bucket {
                bucket: name.to_string(),
                operation: "open",
                message: e.to_string(),
            },
        )?;
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

fn object_error<'a>(
    path: &'a str,
    operation: &'static str,
) -> impl FnOnce(S3Error) -> StorageError + 'a {
    move |e| StorageError::Object {
        path: path.to_string(),
        operation,
        message: e.to_string(),
    }
}

#[async_trait]
impl ObjectStoreClient for RustS3Client {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        self.bucket(bucket)?
            .exists()
            .await
            .map_err(|e| StorageError::Bucket {
                bucket: bucket.to_string(),
                operation: "existence check",
                message: e.to_string(),
            })
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        let create_error = |message: String| StorageError::Bucket {
            bucket: bucket.to_string(),
            operation: "create",
            message,
        };
        let config = BucketConfiguration::default();
        let response = if self.path_style {
            Bucket::create_with_path_style(
                bucket,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await
        } else {
            Bucket::create(bucket, self.region.clone(), self.credentials.clone(), config).await
        }
        .map_err(|e| create_error(e.to_string()))?;

        if response.success() {
            Ok(())
        } else {
            Err(create_error(format!(
                "status {}: {}",
                response.response_code, response.response_text
            )))
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
    ) -> StorageResult<UploadInfo> {
        let response = self
            .bucket(bucket)?
            .put_object(path, &data)
            .await
            .map_err(object_error(path, "upload"))?;

        let etag = response
            .headers()
            .get("etag")
            .map(|tag| tag.trim_matches('"').to_string())
            .unwrap_or_default();
        Ok(UploadInfo {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: data.len() as u64,
            etag,
        })
    }

    async fn get_object(&self, bucket: &str, path: &str) -> StorageResult<StoredObject> {
        let response = self
            .bucket(bucket)?
            .get_object(path)
            .await
            .map_err(object_error(path, "download"))?;
        Ok(StoredObject::new(path, response.bytes().clone()))
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> StorageResult<()> {
        self.bucket(bucket)?
            .delete_object(path)
            .await
            .map(|_| ())
            .map_err(object_error(path, "remove"))
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> ObjectStream {
        let bucket = match self.bucket(bucket) {
            Ok(bucket) => bucket,
            Err(e) => return Box::pin(stream::once(async move { Err(e) })),
        };
        let pages = Pages {
            bucket,
            prefix: prefix.to_string(),
            buffered: VecDeque::new(),
            continuation: None,
            exhausted: false,
        };
        Box::pin(stream::unfold(pages, Pages::next_item).fuse())
    }

    async fn put_object_tagging(
        &self,
        bucket: &str,
        path: &str,
        tags: &ObjectTags,
    ) -> StorageResult<()> {
        let pairs: Vec<(&str, &str)> = tags.iter().collect();
        self.bucket(bucket)?
            .put_object_tagging(path, &pairs)
            .await
            .map(|_| ())
            .map_err(object_error(path, "tagging"))
    }
}

/// Page-at-a-time listing state; a listing error ends the stream
struct Pages {
    bucket: Box<Bucket>,
    prefix: String,
    buffered: VecDeque<ObjectInfo>,
    continuation: Option<String>,
    exhausted: bool,
}

impl Pages {
    async fn next_item(mut self) -> Option<(StorageResult<ObjectInfo>, Self)> {
        loop {
            if let Some(info) = self.buffered.pop_front() {
                return Some((Ok(info), self));
            }
            if self.exhausted {
                return None;
            }

            let page = self
                .bucket
                .list_page(self.prefix.clone(), None, self.continuation.take(), None, None)
                .await;
            match page {
                Ok((result, _)) => {
                    self.buffered
                        .extend(result.contents.into_iter().map(|object| ObjectInfo {
                            path: object.key,
                            size: object.size,
                        }));
                    self.continuation = result.next_continuation_token;
                    self.exhausted = !result.is_truncated || self.continuation.is_none();
                }
                Err(e) => {
                    self.exhausted = true;
                    let error = StorageError::Listing {
                        prefix: self.prefix.clone(),
                        message: e.to_string(),
                    };
                    return Some((Err(error), self));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_error_keeps_path_and_operation() {
        let path = String::from("submissions/42/main.rs");
        let error = object_error(&path, "get")(S3Error::HttpFailWithBody(404, "NoSuchKey".into()));

        match error {
            StorageError::Object { path, operation, message } => {
                assert_eq!(path, "submissions/42/main.rs");
                assert_eq!(operation, "get");
                assert!(message.contains("404"), "got: {}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
