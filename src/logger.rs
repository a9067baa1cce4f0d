//! The local logger: a producer's owned ring of capture arenas and the
//! producer-facing `record`/`flush` operations (spec §3/§4.2).

use std::cell::UnsafeCell;
use std::sync::atomic::{self, Ordering};
use std::sync::OnceLock;

use crate::arena::CaptureArena;
use crate::dispatch::{PrintFn, RecordArgs};
use crate::error::{error_hook, LogError};
use crate::semaphore::MiniSemaphore;
use crate::server::{Drainable, NotifySink};

/// A producer's ring of `N` capture arenas of `B` bytes each.
///
/// Strictly single-producer: no two threads may call [`record`](Self::record)
/// or [`flush`](Self::flush) on the same `LocalLogger` (spec §5). The
/// consumer thread -- reached only through the [`LogServer`](crate::LogServer)
/// this logger is registered with -- is the only reader.
///
/// The documented usage pattern is a `'static` instance, typically a
/// top-level `static LOGGER: LocalLogger<N, B> = LocalLogger::new();`,
/// registered once from its owning producer thread (spec §3 Lifecycles).
pub struct LocalLogger<const N: usize, const B: usize> {
    arenas: UnsafeCell<[CaptureArena<B>; N]>,
    /// Mutated only by the producer thread.
    write_index: UnsafeCell<u8>,
    /// Mutated only by the consumer thread.
    read_index: UnsafeCell<u8>,
    buffers_full: MiniSemaphore,
    server: OnceLock<&'static dyn NotifySink>,
}

// SAFETY: `arenas`, `write_index` and `read_index` are each touched by
// exactly one thread role (producer or consumer) at a time, per the
// handoff protocol documented on `record`/`drain_one`/`advance` below; the
// `MiniSemaphore` and `OnceLock` fields are `Sync` on their own.
unsafe impl<const N: usize, const B: usize> Sync for LocalLogger<N, B> {}

impl<const N: usize, const B: usize> LocalLogger<N, B> {
    /// A fresh, unregistered logger with `N` empty arenas.
    pub const fn new() -> Self {
        Self {
            arenas: UnsafeCell::new([CaptureArena::new(); N]),
            write_index: UnsafeCell::new(0),
            read_index: UnsafeCell::new(0),
            buffers_full: MiniSemaphore::new(),
            server: OnceLock::new(),
        }
    }

    /// Called once by [`LogServer::register`](crate::LogServer::register),
    /// from the registering (producer) thread, so the write of this
    /// reference happens-before the logger's first `record` call.
    pub(crate) fn bind_server(&self, server: &'static dyn NotifySink) {
        // `register` only calls this once per logger; a second call is a
        // caller bug, not a runtime condition worth a `LogError` variant.
        let _ = self.server.set(server);
    }

    /// Producer-only. Captures `args` as a new record in the current write
    /// arena, advancing the ring if needed.
    pub fn record<A: RecordArgs>(&self, args: A) {
        if self.buffers_full.peek() as usize >= N {
            error_hook()(LogError::LoggerFull { arenas: N });
            return;
        }

        // SAFETY: only the producer thread reaches this point (the
        // `peek() < N` check above holds the producer-owned invariant for
        // `write_index`), and only the producer ever mutates `write_index`
        // or the arena it currently points at.
        unsafe {
            let idx = *self.write_index.get() as usize;
            if (*self.arenas.get())[idx].try_push(args) {
                return;
            }
        }

        self.advance();

        unsafe {
            let idx = *self.write_index.get() as usize;
            if (*self.arenas.get())[idx].try_push(args) {
                return;
            }
        }

        error_hook()(LogError::EntryTooLarge {
            entry_size: std::mem::size_of::<A>(),
            capacity: B,
        });
    }

    /// Producer-only. If the current write arena holds any records,
    /// advances the ring so the consumer can drain them. A flush on an
    /// empty arena is a no-op: it does not advance and does not wake the
    /// consumer (spec §4.2, and the Open Question in spec §9 confirming
    /// this asymmetry is intended).
    pub fn flush(&self) {
        if self.buffers_full.peek() as usize >= N {
            // No arena is producer-owned right now; nothing this producer
            // can safely touch until the consumer catches up.
            return;
        }

        // SAFETY: see `record` above.
        let is_empty = unsafe {
            let idx = *self.write_index.get() as usize;
            (*self.arenas.get())[idx].empty()
        };

        if !is_empty {
            self.advance();
        }
    }

    /// Consumer-only. Drains the oldest full arena, if any, against `print`.
    /// Returns whether any work was done.
    pub fn drain_one(&self, print: &PrintFn) -> bool {
        if self.buffers_full.peek() == 0 {
            return false;
        }

        // Ensure every store the producer made into this arena (and the
        // `puts` increment that marked it full) is visible before we read
        // it (spec §4.2 "Rationale for the fences").
        atomic::fence(Ordering::Acquire);

        // SAFETY: only the consumer thread mutates `read_index` or reads
        // the arena it currently points at; `peek() > 0` guarantees that
        // arena has been handed off by the producer.
        unsafe {
            let idx = *self.read_index.get() as usize;
            (*self.arenas.get())[idx].drain(print);
            let read_index = self.read_index.get();
            *read_index = (*read_index + 1) % (N as u8);
        }

        // Ensure the drain (and the reset it performed) completes before
        // `take()` publishes the freed slot back to the producer.
        atomic::fence(Ordering::Release);

        self.buffers_full.take();
        true
    }

    /// Producer-only, private. Hands the current write arena to the
    /// consumer and moves to the next slot.
    ///
    /// Precondition: `buffers_full.peek() < N` and the logger has been
    /// registered. Both are invariant violations if false -- the first is
    /// guaranteed by every call site in this module, the second raises
    /// [`LogError::UnregisteredLogger`].
    fn advance(&self) {
        let server = match self.server.get() {
            Some(server) => *server,
            None => {
                error_hook()(LogError::UnregisteredLogger);
                return;
            }
        };

        debug_assert!(
            (self.buffers_full.peek() as usize) < N,
            "advance() precondition violated: all arenas already full"
        );

        // SAFETY: only the producer thread mutates `write_index`.
        unsafe {
            let write_index = self.write_index.get();
            *write_index = (*write_index + 1) % (N as u8);
        }

        // Pairs with the `Acquire` fence in `drain_one`: every store into
        // the arena just handed off (and the `write_index` update above)
        // must complete before the consumer can observe the `puts`
        // increment below (spec §4.2 "Rationale for the fences").
        atomic::fence(Ordering::Release);

        self.buffers_full.put();
        server.notify_dump_available();
    }
}

impl<const N: usize, const B: usize> Drainable for LocalLogger<N, B> {
    fn drain_one(&self, print: &PrintFn) -> bool {
        LocalLogger::drain_one(self, print)
    }
}
