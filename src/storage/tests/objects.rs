//! Tests for single-object and prefix-wide operations

#[cfg(test)]
mod tests {
    use super::super::{service, BUCKET};
    use crate::storage::{ObjectInfo, ObjectTags, StorageError};
    use futures::StreamExt;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_put_then_get_object() {
        let (service, _store) = service();
        let body: &[u8] = b"hello world";

        let info = service.put_object("docs/hello.txt", body, 11).await.unwrap();
        assert_eq!(info.bucket, BUCKET);
        assert_eq!(info.path, "docs/hello.txt");
        assert_eq!(info.size, 11);
        assert!(!info.etag.is_empty());

        let object = service.get_object("docs/hello.txt").await.unwrap();
        let mut text = String::new();
        object.into_reader().read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn test_put_object_reads_only_declared_size() {
        let (service, _store) = service();
        let body: &[u8] = b"0123456789";

        let info = service.put_object("part", body, 4).await.unwrap();
        assert_eq!(info.size, 4);
        let object = service.get_object("part").await.unwrap();
        assert_eq!(object.bytes().as_ref(), b"0123");
    }

    #[tokio::test]
    async fn test_put_object_short_read_is_error() {
        let (service, store) = service();
        let body: &[u8] = b"abc";

        let result = service.put_object("short", body, 10).await;
        match result {
            Err(StorageError::ShortRead {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 3);
            }
            other => panic!("expected short read, got {:?}", other),
        }
        assert!(store.paths(BUCKET).is_empty(), "Nothing may be uploaded");
    }

    #[tokio::test]
    async fn test_put_object_with_oversized_length_is_short_read() {
        let (service, store) = service();

        let result = service.put_object("x", &b"abc"[..], u64::MAX).await;
        match result {
            Err(StorageError::ShortRead {
                expected, actual, ..
            }) => {
                assert_eq!(expected, u64::MAX);
                assert_eq!(actual, 3);
            }
            other => panic!("expected short read, got {:?}", other),
        }
        assert!(store.paths(BUCKET).is_empty(), "Nothing may be uploaded");
    }

    #[tokio::test]
    async fn test_get_missing_object_fails() {
        let (service, _store) = service();
        let result = service.get_object("missing").await;
        assert!(matches!(result, Err(StorageError::Object { .. })));
    }

    #[tokio::test]
    async fn test_list_objects_is_recursive_and_prefix_bound() {
        let (service, store) = service();
        store.insert(BUCKET, "a/1", "x");
        store.insert(BUCKET, "a/deep/2", "yy");
        store.insert(BUCKET, "b/3", "zzz");

        let listed: Vec<ObjectInfo> = service
            .list_objects("a/")
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(
            listed,
            vec![
                ObjectInfo {
                    path: "a/1".to_string(),
                    size: 1
                },
                ObjectInfo {
                    path: "a/deep/2".to_string(),
                    size: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_objects_stops_at_listing_error() {
        let (service, store) = service();
        store.insert(BUCKET, "logs/1", "a");
        store.insert(BUCKET, "logs/2", "b");
        store.insert(BUCKET, "logs/3", "c");
        store.fail_listing_at(1);

        let result = service.remove_objects("logs/").await;

        assert!(matches!(result, Err(StorageError::Listing { .. })));
        assert_eq!(store.removed(), vec!["logs/1".to_string()]);
        assert_eq!(store.paths(BUCKET), vec!["logs/2", "logs/3"]);
    }

    #[tokio::test]
    async fn test_remove_objects_stops_at_removal_error() {
        let (service, store) = service();
        store.insert(BUCKET, "logs/1", "a");
        store.insert(BUCKET, "logs/2", "b");
        store.insert(BUCKET, "logs/3", "c");
        store.fail_removal("logs/2");

        let result = service.remove_objects("logs/").await;

        assert!(matches!(result, Err(StorageError::Object { .. })));
        assert_eq!(store.removed(), vec!["logs/1", "logs/2"]);
        assert_eq!(store.paths(BUCKET), vec!["logs/2", "logs/3"]);
    }

    #[tokio::test]
    async fn test_size_of_sums_listing() {
        let (service, store) = service();
        store.insert(BUCKET, "data/a", vec![0u8; 10]);
        store.insert(BUCKET, "data/b", vec![0u8; 20]);
        store.insert(BUCKET, "data/c", vec![0u8; 30]);
        store.insert(BUCKET, "other", vec![0u8; 99]);

        assert_eq!(service.size_of("data/").await.unwrap(), 60);
        assert_eq!(service.size_of("nothing/").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_size_of_propagates_listing_error() {
        let (service, store) = service();
        store.insert(BUCKET, "data/a", vec![0u8; 10]);
        store.fail_listing_at(1);

        assert!(service.size_of("data/").await.is_err());
    }

    #[tokio::test]
    async fn test_schedule_for_deletion_stops_at_tagging_failure() {
        let (service, store) = service();
        store.insert(BUCKET, "t/1", "a");
        store.insert(BUCKET, "t/2", "b");
        store.insert(BUCKET, "t/3", "c");
        store.fail_tagging("t/2");

        let result = service.schedule_for_deletion("t/").await;

        assert!(result.is_err());
        assert_eq!(store.tagged(), vec!["t/1"]);
        assert_eq!(store.object_tags(BUCKET, "t/1"), Some(ObjectTags::to_delete()));
        assert_eq!(store.object_tags(BUCKET, "t/3"), Some(ObjectTags::new()));
    }
}
