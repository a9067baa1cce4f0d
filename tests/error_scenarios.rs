//! End-to-end scenarios for the two producer-side fatal conditions. Both
//! trip the process-wide error hook, so this file installs one silent hook
//! up front and keeps every triggering assertion in this binary.

use quicklog::platform::YieldAdapter;
use quicklog::{set_error_hook, LocalLogger, LogServer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// `set_error_hook` only wins once per process, and `cargo test` runs the
// functions below on separate threads by default, so every test in this
// file takes this lock for its whole body: it both keeps the counter
// meaningful across tests and stops them from tripping each other's error
// while a `before`/`after` comparison is in flight.
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn install_counting_hook() -> &'static AtomicUsize {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let _ = set_error_hook(|_| {
        COUNTER.fetch_add(1, Ordering::SeqCst);
    });
    &COUNTER
}

#[test]
fn a_record_too_large_for_an_empty_arena_raises_entry_too_large() {
    let _guard = TEST_LOCK.lock().unwrap();
    let counter = install_counting_hook();
    let before = counter.load(Ordering::SeqCst);

    // header(16) + payload(100) aligned up to 16 = 128 bytes, which cannot
    // fit in a 64-byte arena even when completely empty.
    static LOGGER: LocalLogger<2, 64> = LocalLogger::new();
    let server: &'static LogServer<1, YieldAdapter> =
        Box::leak(Box::new(LogServer::new(YieldAdapter, |_| {})));
    server.register(&LOGGER);

    LOGGER.record([0u8; 100]);

    assert_eq!(counter.load(Ordering::SeqCst), before + 1);
}

#[test]
fn a_fully_handed_off_ring_raises_logger_full_on_the_next_record() {
    let _guard = TEST_LOCK.lock().unwrap();
    let counter = install_counting_hook();
    let before = counter.load(Ordering::SeqCst);

    static LOGGER: LocalLogger<2, 4096> = LocalLogger::new();
    let server: &'static LogServer<1, YieldAdapter> =
        Box::leak(Box::new(LogServer::new(YieldAdapter, |_| {})));
    server.register(&LOGGER);

    // Consumer never runs: each record + flush hands an arena off without
    // draining it, so after N=2 such pairs both arenas await drain.
    LOGGER.record(1i32);
    LOGGER.flush();
    LOGGER.record(2i32);
    LOGGER.flush();
    LOGGER.record(3i32);
    assert_eq!(counter.load(Ordering::SeqCst), before + 1);
}
