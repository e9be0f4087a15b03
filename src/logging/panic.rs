//! Panic observation

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

fn report(payload: &(dyn Any + Send)) {
    log::error!("panic: {}", panic_message(payload));
    log::logger().flush();
    if let Some(client) = sentry::Hub::current().client() {
        client.flush(Some(FLUSH_TIMEOUT));
    }
}

/// Run `f`, logging any panic at error level before letting it continue
///
/// The panic is resumed after it is logged (and, when a reporter is
/// installed, sent), so the caller still unwinds.
pub fn recover_and_log_panic<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    // The panic is always resumed, so no state is observed after unwinding
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            report(payload.as_ref());
            panic::resume_unwind(payload)
        }
    }
}

/// Await `future` with the same panic handling as [`recover_and_log_panic`]
pub async fn recover_and_log_panic_async<F>(future: F) -> F::Output
where
    F: Future,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(value) => value,
        Err(payload) => {
            report(payload.as_ref());
            panic::resume_unwind(payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_value_without_panic() {
        assert_eq!(recover_and_log_panic(|| 21 * 2), 42);
    }

    #[test]
    fn test_panic_is_resumed() {
        let outcome = panic::catch_unwind(|| recover_and_log_panic(|| -> () { panic!("boom") }));

        let payload = outcome.expect_err("panic must propagate");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_formatted_panic_message() {
        let outcome = panic::catch_unwind(|| {
            recover_and_log_panic(|| -> () { panic!("worker {} failed", 3) })
        });
        let payload = outcome.expect_err("panic must propagate");
        assert_eq!(panic_message(payload.as_ref()), "worker 3 failed");
    }

    #[tokio::test]
    async fn test_async_panic_is_resumed() {
        let value = recover_and_log_panic_async(async { "done" }).await;
        assert_eq!(value, "done");

        let outcome = AssertUnwindSafe(recover_and_log_panic_async(async {
            panic!("async boom");
        }))
        .catch_unwind()
        .await;
        let payload = outcome.expect_err("panic must propagate");
        assert_eq!(panic_message(payload.as_ref()), "async boom");
    }
}
