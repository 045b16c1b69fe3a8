use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Acquire `lock`, recovering the inner state if a previous holder panicked.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned console state lock"
            );
            poisoned.into_inner()
        }
    }
}
