//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "Timed out waiting for {}", what);
}

/// Write `contents` to a temporary `.toml` file
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temporary config file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temporary config file");
    file
}
