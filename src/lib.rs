//! A lock-free, wait-free, block-free logger for multi-threaded `std` programs.
//!
//! (lock-free as in a producer's `record` call never blocks on another
//! producer; wait-free as in there's no spinning or CAS loop to capture a
//! record; and block-free as in a producer never waits for the formatting
//! or I/O the consumer eventually does)
//!
//! # Working principle
//!
//! Each producer thread owns a [`LocalLogger`]: a small ring of fixed-size
//! capture arenas. Calling [`LocalLogger::record`]
//! bitwise-copies the argument pack into the current arena -- no formatting,
//! no locking, no allocation, just a bump-pointer write. When an arena
//! fills, or [`LocalLogger::flush`] is called explicitly, the arena is
//! handed off to a registered [`LogServer`] running on a dedicated consumer
//! thread, which formats and emits each record through a single
//! host-supplied print callable.
//!
//! Nothing is without trade-offs: this logger holds plenty of static memory
//! (one fixed-size arena ring per producer) in exchange for a producer-side
//! fast path that is as cheap as a `memcpy`. Compared to loggers that do I/O
//! synchronously, this design spends more total CPU work to log the same
//! data, but almost none of it is spent on the thread that's actually doing
//! application work.
//!
//! # Example
//!
//! ```
//! use quicklog::{record, LocalLogger, LogServer};
//! use quicklog::platform::StdAdapter;
//! use std::thread;
//!
//! static LOGGER: LocalLogger<4, 256> = LocalLogger::new();
//! static SERVER: std::sync::OnceLock<LogServer<8, StdAdapter>> = std::sync::OnceLock::new();
//!
//! let server = SERVER.get_or_init(|| {
//!     LogServer::new(StdAdapter::new(), |args| println!("{:?}", args))
//! });
//! server.register(&LOGGER);
//!
//! let consumer = thread::spawn(move || server.run_consumer());
//!
//! record!(LOGGER, "connected", 7u32);
//! LOGGER.flush();
//!
//! server.shutdown();
//! consumer.join().unwrap();
//! ```
//!
//! # Benchmarks
//!
//! No `benches/` harness ships with this crate (out of scope, per the
//! design notes: throughput numbers depend on the host's print callable
//! and platform adapter, neither of which this crate controls). The
//! property this design optimizes for is constant-time, allocation-free
//! capture on the producer's fast path -- `record` is a bounds check plus a
//! bump-pointer `memcpy`, regardless of how many producers or how slow the
//! consumer's formatting turns out to be.
//!
//! # Potential improvements
//!
//! - A `no_std` variant of [`platform::PlatformAdapter`] backed by an
//!   interrupt-driven wait/notify primitive, for the embedded targets this
//!   design was originally drawn from.
//! - Per-logger backpressure policies (drop-oldest, drop-newest) as an
//!   alternative to raising [`LogError::LoggerFull`] when every arena is
//!   awaiting drain.

mod arena;
mod dispatch;
mod error;
mod logger;
pub mod platform;
mod semaphore;
mod server;

pub use dispatch::{PrintFn, RecordArgs};
pub use error::{set_error_hook, ErrorHook, LogError};
pub use logger::LocalLogger;
pub use platform::PlatformAdapter;
pub use server::{Drainable, LogServer, NotifySink};
