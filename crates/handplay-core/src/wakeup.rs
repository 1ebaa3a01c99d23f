//! Coalescing wakeup signal for the UI thread.
//!
//! A pending flag guarded by a mutex and condition variable. Any number of
//! `signal()` calls between two waits collapse into one early return, and a
//! signal that lands before the UI thread starts waiting is never lost.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Why [`WakeupGate::wait_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    Signaled,
    Deadline,
}

#[derive(Debug, Default)]
pub struct WakeupGate {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl WakeupGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request an early wake. Safe from any thread.
    pub fn signal(&self) {
        let mut pending = self.lock();
        if !*pending {
            *pending = true;
            self.cond.notify_one();
        }
    }

    pub fn is_pending(&self) -> bool {
        *self.lock()
    }

    /// Block until `deadline` or a signal. The pending flag is cleared on
    /// return either way.
    pub fn wait_until(&self, deadline: Instant) -> WakeReason {
        let mut pending = self.lock();
        loop {
            if *pending {
                *pending = false;
                return WakeReason::Signaled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WakeReason::Deadline;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(pending, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            pending = guard;
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> WakeReason {
        self.wait_until(Instant::now() + timeout)
    }
}

/// Cloneable, thread-safe handle that wakes the UI thread.
#[derive(Debug, Clone)]
pub struct Waker {
    gate: Arc<WakeupGate>,
}

impl Waker {
    pub fn new(gate: Arc<WakeupGate>) -> Self {
        Self { gate }
    }

    pub fn wake(&self) {
        self.gate.signal();
    }
}
