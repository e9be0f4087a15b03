//! Object storage integration tests
//!
//! Walks a submission through upload, listing, sizing, tagging and removal.

use futures::TryStreamExt;
use tereus_std::storage::{
    InMemoryObjectStore, ObjectInfo, ObjectTags, S3Config, S3Service, StorageError,
};
use tokio::io::AsyncReadExt;

fn service(store: &InMemoryObjectStore) -> S3Service<InMemoryObjectStore> {
    let config = S3Config::new("minio:9000", "minio", "minio123", "submissions", false);
    S3Service::new(config, store.clone()).unwrap()
}

async fn upload(service: &S3Service<InMemoryObjectStore>, path: &str, body: &[u8]) {
    service
        .put_object(path, body, body.len() as u64)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_submission_lifecycle() {
    let store = InMemoryObjectStore::new();
    let service = service(&store);
    service.ensure_bucket("submissions").await.unwrap();

    upload(&service, "transpilations/7/main.c", b"int main() { return 0; }").await;
    upload(&service, "transpilations/7/util.h", b"#pragma once").await;
    upload(&service, "transpilations-results/7/main.rs", b"fn main() {}").await;
    upload(&service, "transpilations/8/main.c", b"int x;").await;

    let files: Vec<ObjectInfo> = service
        .list_submission_files("7")
        .try_collect()
        .await
        .unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(service.size_of("transpilations/7").await.unwrap(), 24 + 12);

    let mut source = String::new();
    service
        .get_object("transpilations-results/7/main.rs")
        .await
        .unwrap()
        .into_reader()
        .read_to_string(&mut source)
        .await
        .unwrap();
    assert_eq!(source, "fn main() {}");

    service.schedule_submission_for_deletion("7").await.unwrap();
    for file in &files {
        assert_eq!(
            store.object_tags("submissions", &file.path),
            Some(ObjectTags::to_delete())
        );
    }

    service.delete_submission("7").await.unwrap();
    assert_eq!(store.paths("submissions"), vec!["transpilations/8/main.c"]);
}

#[tokio::test]
async fn test_listing_error_surfaces_inline() {
    let store = InMemoryObjectStore::new();
    store.create_bucket("submissions");
    store.insert("submissions", "transpilations/9/a", "a");
    store.insert("submissions", "transpilations/9/b", "b");
    store.fail_listing_at(1);
    let service = service(&store);

    let items: Vec<_> = futures::StreamExt::collect(service.list_objects("transpilations/9")).await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(StorageError::Listing { .. })));

    assert!(service.delete_submission("9").await.is_err());
    assert_eq!(store.removed(), vec!["transpilations/9/a"]);
}
