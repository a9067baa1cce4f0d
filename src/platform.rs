//! The platform adapter: the host-supplied `wait`/`notify`/`lock`/`unlock`
//! capability set the [`LogServer`](crate::LogServer) is parametrized over
//! (spec §4.5/§6).

use lock_api::RawMutex as _;
use parking_lot::{Condvar, Mutex, RawMutex};
use std::thread;

/// Host-supplied `wait`/`notify`/`lock`/`unlock` primitives.
///
/// `wait`/`notify` gate the consumer's sleep; `lock`/`unlock` guard the
/// server's registry only -- they are never acquired on a producer's
/// `record`/`flush` fast path (spec §4.4 rationale).
pub trait PlatformAdapter: Send + Sync {
    /// Blocks until a subsequent [`notify`](Self::notify). Spurious
    /// wakeups are allowed.
    fn wait(&self);

    /// Wakes at most one waiter in `wait`, or records a pending wake if
    /// nobody is currently waiting.
    fn notify(&self);

    /// Acquires the registry lock.
    fn lock(&self);

    /// Releases the registry lock.
    fn unlock(&self);
}

/// The default, ready-to-use adapter: a `parking_lot` raw mutex for the
/// registry (matching spec §4.5's separate, non-RAII `lock`/`unlock`
/// operations -- `std::sync::Mutex`'s guard-scoped API can't express that
/// directly, but `parking_lot`'s raw lock can) plus a condvar-guarded
/// pending-wake flag for `wait`/`notify`, so a `notify()` that arrives
/// while nobody is waiting is not lost.
pub struct StdAdapter {
    registry_lock: RawMutex,
    pending_wake: Mutex<bool>,
    condvar: Condvar,
}

impl StdAdapter {
    /// A fresh adapter with an unlocked registry and no pending wake.
    pub fn new() -> Self {
        Self {
            registry_lock: RawMutex::INIT,
            pending_wake: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }
}

impl Default for StdAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for StdAdapter {
    fn wait(&self) {
        let mut pending = self.pending_wake.lock();
        if !*pending {
            self.condvar.wait(&mut pending);
        }
        *pending = false;
    }

    fn notify(&self) {
        let mut pending = self.pending_wake.lock();
        *pending = true;
        self.condvar.notify_one();
    }

    fn lock(&self) {
        self.registry_lock.lock();
    }

    fn unlock(&self) {
        // SAFETY: every `unlock` call in this crate is paired with a
        // preceding `lock` call on the same adapter instance (`LogServer`
        // always calls them as `lock(); ...; unlock();` within one
        // function), so the raw mutex is always held by the caller here.
        unsafe { self.registry_lock.unlock() };
    }
}

/// A degenerate adapter: `wait` yields the CPU instead of sleeping, `notify`
/// is a no-op, `lock`/`unlock` are no-ops.
///
/// Explicitly sanctioned by spec §4.5 "at the cost of consumer
/// busy-polling." Valid only when the host does not call
/// [`LogServer::register`](crate::LogServer::register) concurrently with
/// the consumer thread's drain loop, since there is no real mutual
/// exclusion behind `lock`/`unlock` here.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldAdapter;

impl PlatformAdapter for YieldAdapter {
    fn wait(&self) {
        thread::yield_now();
    }

    fn notify(&self) {}

    fn lock(&self) {}

    fn unlock(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn notify_before_wait_is_not_lost() {
        let adapter = Arc::new(StdAdapter::new());
        adapter.notify();
        // must return promptly; a hang here means the pending wake was lost
        adapter.wait();
    }

    #[test]
    fn wait_wakes_on_notify_from_another_thread() {
        let adapter = Arc::new(StdAdapter::new());
        let a2 = adapter.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            a2.notify();
        });
        adapter.wait();
        handle.join().unwrap();
    }

    #[test]
    fn lock_unlock_round_trips() {
        let adapter = StdAdapter::new();
        adapter.lock();
        adapter.unlock();
        adapter.lock();
        adapter.unlock();
    }
}
