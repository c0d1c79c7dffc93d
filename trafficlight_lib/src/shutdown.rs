//! A one-shot shutdown signal.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A clonable flag that threads can sleep on.
///
/// Once triggered it stays triggered, and every thread sleeping in `wait_timeout` wakes immediately.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    /// Creates an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the signal. Calling it again has no effect.
    pub fn trigger(&self) {
        let (triggered, changed) = &*self.inner;
        *triggered.lock().unwrap_or_else(PoisonError::into_inner) = true;
        changed.notify_all();
    }

    /// Returns `true` if the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        let (triggered, _) = &*self.inner;
        *triggered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for up to `timeout`, returning early with `true` if the signal is triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (triggered, changed) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut guard = triggered.lock().unwrap_or_else(PoisonError::into_inner);
        while !*guard {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = changed
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}
