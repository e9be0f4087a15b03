//! Tests for publishing and writer caching

#[cfg(test)]
mod tests {
    use super::super::test_config;
    use crate::kafka::{
        BrokerConnector, InMemoryBroker, KafkaError, KafkaResult, KafkaService, Record,
        TopicReader, TopicWriter,
    };
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_publish_reuses_writer_per_topic() {
        let broker = InMemoryBroker::new();
        let service = KafkaService::new(test_config(), broker.clone()).unwrap();

        service.publish("submissions", "id-1", b"first").await.unwrap();
        service.publish("submissions", "id-2", b"second").await.unwrap();

        assert_eq!(broker.writers_opened(), 1, "Second publish must reuse the writer");
        assert_eq!(service.writer_count().unwrap(), 1);
        assert_eq!(
            broker.records("submissions"),
            vec![
                Record {
                    key: b"id-1".to_vec(),
                    payload: b"first".to_vec()
                },
                Record {
                    key: b"id-2".to_vec(),
                    payload: b"second".to_vec()
                },
            ]
        );

        service.publish("results", "id-1", b"done").await.unwrap();
        assert_eq!(broker.writers_opened(), 2, "A new topic gets its own writer");
        assert_eq!(service.writer_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_publishes_open_single_writer() {
        let broker = InMemoryBroker::new();
        let service = Arc::new(KafkaService::new(test_config(), broker.clone()).unwrap());

        let mut tasks = JoinSet::new();
        for i in 0..16 {
            let service = Arc::clone(&service);
            tasks.spawn(async move {
                service
                    .publish("busy", &format!("key-{}", i), b"payload")
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        assert_eq!(broker.writers_opened(), 1);
        assert_eq!(broker.records("busy").len(), 16);
    }

    #[tokio::test]
    async fn test_publish_returns_write_error() {
        let broker = InMemoryBroker::new();
        broker.fail_writes("broken");
        let service = KafkaService::new(test_config(), broker.clone()).unwrap();

        let result = service.publish("broken", "key", b"payload").await;

        assert!(matches!(result, Err(KafkaError::Write { ref topic, .. }) if topic == "broken"));
        assert!(broker.records("broken").is_empty());
    }

    #[tokio::test]
    async fn test_close_all_writers_continues_past_failures() {
        let broker = InMemoryBroker::new();
        broker.fail_closes("first");
        let service = KafkaService::new(test_config(), broker.clone()).unwrap();

        service.publish("first", "k", b"1").await.unwrap();
        service.publish("second", "k", b"2").await.unwrap();

        service.close_all_writers().await;

        assert_eq!(broker.writers_closed(), 2, "A failing close must not skip the rest");
        assert_eq!(service.writer_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_after_close_opens_fresh_writer() {
        let broker = InMemoryBroker::new();
        let service = KafkaService::new(test_config(), broker.clone()).unwrap();

        service.publish("topic", "k", b"before").await.unwrap();
        service.close_all_writers().await;
        service.publish("topic", "k", b"after").await.unwrap();

        assert_eq!(broker.writers_opened(), 2);
        assert_eq!(broker.records("topic").len(), 2);
    }

    /// Connector whose writer factory panics while the writer cache is held
    struct PanickingConnector;

    impl BrokerConnector for PanickingConnector {
        fn open_writer(&self, topic: &str) -> KafkaResult<Arc<dyn TopicWriter>> {
            panic!("broker client crashed opening '{}'", topic);
        }

        fn open_reader(&self, topic: &str, _group_id: &str) -> KafkaResult<Box<dyn TopicReader>> {
            Err(KafkaError::Connect {
                topic: topic.to_string(),
                role: "reader",
                message: "not available".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_poisoned_writer_cache_is_reported() {
        let service = Arc::new(KafkaService::new(test_config(), PanickingConnector).unwrap());
        assert_eq!(service.writer_count().unwrap(), 0);

        let crashed = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.publish("topic", "k", b"x").await })
        };
        assert!(crashed.await.is_err(), "The panic must surface as a join error");

        assert!(matches!(service.writer_count(), Err(KafkaError::Internal { .. })));
        let result = service.publish("topic", "k", b"y").await;
        assert!(matches!(result, Err(KafkaError::Internal { .. })));
    }
}
