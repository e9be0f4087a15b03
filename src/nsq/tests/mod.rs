//! Test modules for the NSQ client

mod service;

use crate::nsq::NsqConfig;
use std::time::Duration;

pub(super) const LOOKUPD: &str = "127.0.0.1:4161";

pub(super) fn test_config() -> NsqConfig {
    NsqConfig {
        concurrency: Some(2),
        ..NsqConfig::new("127.0.0.1:4150", LOOKUPD)
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub(super) async fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "Timed out waiting for {}", what);
}
