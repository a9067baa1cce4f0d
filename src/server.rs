//! The log server: the consumer side of the core -- a fixed-size registry of
//! producer loggers, the wake/drain loop, and the single owned print
//! callable every registered logger is drained against (spec §3/§4.4).

use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dispatch::PrintFn;
use crate::error::{error_hook, LogError};
use crate::platform::PlatformAdapter;

/// Anything a [`LogServer`] can drain one record-batch out of.
///
/// Implemented by [`LocalLogger`](crate::LocalLogger) for every `N, B`; the
/// registry stores `&'static dyn Drainable` so a single server can hold
/// loggers of different arena counts and sizes side by side.
pub trait Drainable: Send + Sync {
    /// Drains the oldest full arena, if any. Returns whether work was done.
    fn drain_one(&self, print: &PrintFn) -> bool;
}

/// The half of [`LogServer`] a [`LocalLogger`](crate::LocalLogger) needs to
/// call back into after advancing its ring -- just enough to wake the
/// consumer, without the logger needing to know the server's `MAX_LOGGERS`
/// or `PlatformAdapter` type (spec §4.4, breaking the circular dependency
/// between the two types).
pub trait NotifySink: Send + Sync {
    /// Called by a registered logger's `advance()` after handing off an
    /// arena, so the consumer wakes promptly instead of waiting out its
    /// next spurious-wakeup cycle.
    fn notify_dump_available(&self);
}

/// The consumer side of the core: a fixed-capacity registry of producer
/// loggers, drained round-robin whenever woken (spec §3 Log Server).
///
/// `MAX_LOGGERS` bounds how many [`LocalLogger`](crate::LocalLogger)s may
/// ever [`register`](Self::register) with one server -- registration beyond
/// that capacity raises [`LogError::RegistryFull`] rather than growing the
/// registry, matching the fixed-size, allocation-free posture of the rest of
/// the core (spec §9).
pub struct LogServer<const MAX_LOGGERS: usize, P: PlatformAdapter> {
    adapter: P,
    print: Box<PrintFn>,
    registry: UnsafeCell<[Option<&'static dyn Drainable>; MAX_LOGGERS]>,
    count: UnsafeCell<usize>,
    run: AtomicBool,
}

// SAFETY: `registry` and `count` are only ever mutated while `adapter.lock()`
// is held (`register`), or read from the single consumer thread (`drain_all`,
// itself only ever called from `run_consumer`/tests under the same lock).
unsafe impl<const MAX_LOGGERS: usize, P: PlatformAdapter> Sync for LogServer<MAX_LOGGERS, P> {}

impl<const MAX_LOGGERS: usize, P: PlatformAdapter> LogServer<MAX_LOGGERS, P> {
    /// A server with an empty registry, ready to [`register`](Self::register)
    /// loggers and eventually [`run_consumer`](Self::run_consumer).
    ///
    /// `print` is invoked by the consumer thread only, once per drained
    /// record, with that record's decoded argument pack (spec §6).
    pub fn new(adapter: P, print: impl Fn(&dyn fmt::Debug) + Send + Sync + 'static) -> Self {
        Self {
            adapter,
            print: Box::new(print),
            registry: UnsafeCell::new([None; MAX_LOGGERS]),
            count: UnsafeCell::new(0),
            run: AtomicBool::new(true),
        }
    }

    /// Registers `logger` with this server, to be called once from the
    /// logger's owning producer thread before its first `record` call (spec
    /// §3 Lifecycles). Both must be `'static`, matching the crate's
    /// documented usage pattern of static-lifetime loggers and servers.
    pub fn register<const N: usize, const B: usize>(
        &'static self,
        logger: &'static crate::logger::LocalLogger<N, B>,
    ) {
        self.adapter.lock();
        // SAFETY: the registry lock is held for the whole critical section.
        let registered = unsafe {
            let count = &mut *self.count.get();
            if *count >= MAX_LOGGERS {
                false
            } else {
                (*self.registry.get())[*count] = Some(logger);
                *count += 1;
                true
            }
        };
        self.adapter.unlock();

        if registered {
            logger.bind_server(self);
        } else {
            error_hook()(LogError::RegistryFull {
                registered: MAX_LOGGERS,
                capacity: MAX_LOGGERS,
            });
        }
    }

    /// One round-robin sweep over the registry, draining every logger until
    /// none has any more full arenas. Consumer-only.
    pub fn drain_all(&self) {
        self.adapter.lock();
        // SAFETY: registry entries are appended-only after registration, and
        // the lock excludes concurrent `register` calls; nothing else
        // mutates `registry`/`count`.
        let count = unsafe { *self.count.get() };
        let mut did_work = true;
        while did_work {
            did_work = false;
            for i in 0..count {
                let logger = unsafe { (*self.registry.get())[i] };
                if let Some(logger) = logger {
                    did_work |= logger.drain_one(&self.print);
                }
            }
        }
        self.adapter.unlock();
    }

    /// Runs the consumer loop: wait for a wake, drain everything, repeat,
    /// until [`shutdown`](Self::shutdown) is observed. Performs one final
    /// drain after the run flag clears, so records flushed right before
    /// shutdown are not lost (spec §4.4).
    pub fn run_consumer(&self) {
        while self.run.load(Ordering::Acquire) {
            self.adapter.wait();
            self.drain_all();
        }
        self.drain_all();
    }

    /// Signals [`run_consumer`](Self::run_consumer) to perform one last
    /// drain and return. Safe to call from any thread.
    pub fn shutdown(&self) {
        self.run.store(false, Ordering::Release);
        self.adapter.notify();
    }
}

impl<const MAX_LOGGERS: usize, P: PlatformAdapter> NotifySink for LogServer<MAX_LOGGERS, P> {
    fn notify_dump_available(&self) {
        self.adapter.notify();
    }
}
