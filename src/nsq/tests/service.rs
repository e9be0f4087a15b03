//! Tests for registration, publishing and shutdown

#[cfg(test)]
mod tests {
    use super::super::{test_config, LOOKUPD};
    use crate::nsq::{handler_fn, InMemoryNsq, NsqError, NsqService};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_then_shutdown() {
        let nsq = InMemoryNsq::new();
        let service = Arc::new(NsqService::new(test_config(), nsq.clone()).unwrap());

        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let service = Arc::clone(&service);
            tasks.spawn(async move {
                service
                    .register_handler(
                        "jobs",
                        &format!("channel-{}", i),
                        handler_fn(|_| async { Ok(()) }),
                    )
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(service.consumer_count().await, 8);
        assert_eq!(nsq.lookupd_connections(), vec![LOOKUPD.to_string(); 8]);

        service.shutdown().await;
        assert_eq!(nsq.stopped_sources(), 8);
        assert_eq!(nsq.stopped_producers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registrations_racing_shutdown_are_all_stopped() {
        let nsq = InMemoryNsq::new();
        let service = Arc::new(NsqService::new(test_config(), nsq.clone()).unwrap());

        let mut registrations = JoinSet::new();
        for i in 0..16 {
            let service = Arc::clone(&service);
            registrations.spawn(async move {
                service
                    .register_handler(
                        "jobs",
                        &format!("channel-{}", i),
                        handler_fn(|_| async { Ok(()) }),
                    )
                    .await
            });
        }
        let shutdown = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.shutdown().await })
        };

        let mut registered = 0;
        while let Some(result) = registrations.join_next().await {
            match result.unwrap() {
                Ok(()) => registered += 1,
                Err(NsqError::ShutDown) => {}
                Err(e) => panic!("unexpected registration error: {}", e),
            }
        }
        shutdown.await.unwrap();

        assert_eq!(service.consumer_count().await, registered);
        assert_eq!(
            nsq.stopped_sources(),
            nsq.lookupd_connections().len(),
            "Every subscribed consumer must be stopped"
        );
        assert_eq!(nsq.stopped_producers(), 1);
    }

    #[tokio::test]
    async fn test_register_after_shutdown_is_refused() {
        let nsq = InMemoryNsq::new();
        let service = NsqService::new(test_config(), nsq.clone()).unwrap();
        service.shutdown().await;

        let result = service
            .register_handler("jobs", "workers", handler_fn(|_| async { Ok(()) }))
            .await;

        assert!(matches!(result, Err(NsqError::ShutDown)));
        assert_eq!(service.consumer_count().await, 0);
        assert!(nsq.lookupd_connections().is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_fails() {
        let nsq = InMemoryNsq::new();
        let service = NsqService::new(test_config(), nsq.clone()).unwrap();

        service.publish("jobs", b"before".to_vec()).await.unwrap();
        service.shutdown().await;

        let result = service.publish("jobs", b"after".to_vec()).await;
        assert!(matches!(result, Err(NsqError::Publish { .. })));
        assert_eq!(nsq.published_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_lookupd_returns_error() {
        let nsq = InMemoryNsq::new();
        nsq.make_lookupd_unreachable(LOOKUPD);
        let service = NsqService::new(test_config(), nsq.clone()).unwrap();

        let result = service
            .register_handler("jobs", "workers", handler_fn(|_| async { Ok(()) }))
            .await;

        match result {
            Err(NsqError::Connect { endpoint, .. }) => assert_eq!(endpoint, LOOKUPD),
            other => panic!("expected connect error, got {:?}", other.err()),
        }
        assert_eq!(service.consumer_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_names_rejected_before_connecting() {
        let nsq = InMemoryNsq::new();
        let service = NsqService::new(test_config(), nsq.clone()).unwrap();

        let bad_topic = service
            .register_handler("bad topic", "workers", handler_fn(|_| async { Ok(()) }))
            .await;
        assert!(matches!(bad_topic, Err(NsqError::InvalidName { kind: "topic", .. })));

        let bad_channel = service
            .register_handler("jobs", "", handler_fn(|_| async { Ok(()) }))
            .await;
        assert!(matches!(
            bad_channel,
            Err(NsqError::InvalidName { kind: "channel", .. })
        ));

        assert!(service.publish("bad/topic", b"x".to_vec()).await.is_err());
        assert!(nsq.lookupd_connections().is_empty());
    }

    #[test]
    fn test_new_uses_nsqd_endpoint() {
        let nsq = InMemoryNsq::new();
        let service = NsqService::new(test_config(), nsq.clone()).unwrap();

        assert_eq!(nsq.producer_endpoints(), vec!["127.0.0.1:4150".to_string()]);
        assert_eq!(service.config().concurrency, Some(2));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = NsqService::new(Default::default(), InMemoryNsq::new());
        assert!(matches!(result, Err(NsqError::Configuration { .. })));
    }
}
