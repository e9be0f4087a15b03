//! Lock poisoning helpers
//!
//! Every service in this crate guards a small amount of shared state with
//! `std::sync` locks (writer caches, in-memory backends). A poisoned lock means
//! another thread panicked mid-update; these helpers turn that into the calling
//! module's error type instead of propagating the panic.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

fn poison_message(lock_kind: &str, what: &str) -> String {
    format!(
        "{} poisoned while guarding {}: a thread panicked while holding the lock",
        lock_kind, what
    )
}

/// Convert a poisoned `Mutex::lock()` result into a module error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use tereus_std::core::sync::lock_or_err;
///
/// let cache = Mutex::new(Vec::<u8>::new());
/// let guard = lock_or_err(cache.lock(), "writer cache", |msg| msg).unwrap();
/// assert!(guard.is_empty());
/// ```
pub fn lock_or_err<'a, T, E>(
    result: LockResult<MutexGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    result.map_err(|_| error_constructor(poison_message("Mutex", what)))
}

/// Convert a poisoned `RwLock::read()` result into a module error
pub fn read_or_err<'a, T, E>(
    result: LockResult<RwLockReadGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'a, T>, E> {
    result.map_err(|_| error_constructor(poison_message("RwLock (read)", what)))
}

/// Convert a poisoned `RwLock::write()` result into a module error
pub fn write_or_err<'a, T, E>(
    result: LockResult<RwLockWriteGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'a, T>, E> {
    result.map_err(|_| error_constructor(poison_message("RwLock (write)", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, RwLock};
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct TestError(String);

    #[test]
    fn test_lock_or_err_success() {
        let mutex = Mutex::new(7);
        let guard = lock_or_err(mutex.lock(), "counter", TestError).unwrap();
        assert_eq!(*guard, 7);
    }

    #[test]
    fn test_lock_or_err_poisoned() {
        let mutex = Arc::new(Mutex::new(7));
        let mutex_clone = Arc::clone(&mutex);

        let _ = thread::spawn(move || {
            let _guard = mutex_clone.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        let error = lock_or_err(mutex.lock(), "counter", TestError).unwrap_err();
        assert!(error.0.contains("Mutex poisoned"));
        assert!(error.0.contains("counter"));
    }

    #[test]
    fn test_write_then_read() {
        let rwlock = RwLock::new(1);

        *write_or_err(rwlock.write(), "value", TestError).unwrap() = 2;

        let guard = read_or_err(rwlock.read(), "value", TestError).unwrap();
        assert_eq!(*guard, 2);
    }

    #[test]
    fn test_read_or_err_poisoned() {
        let rwlock = Arc::new(RwLock::new(1));
        let rwlock_clone = Arc::clone(&rwlock);

        let _ = thread::spawn(move || {
            let _guard = rwlock_clone.write().unwrap();
            panic!("poison the rwlock");
        })
        .join();

        let error = read_or_err(rwlock.read(), "value", TestError).unwrap_err();
        assert!(error.0.contains("RwLock (read) poisoned"));
    }
}
