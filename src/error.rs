//! The global error hook and the taxonomy of fatal conditions it is invoked with.
//!
//! Every condition here is a configuration error or a bug, never a transient
//! fault: a timing-critical logger must not silently drop an event and must
//! not hide a sizing mistake behind a retry. There is no retry, no
//! queue-to-disk, no circuit-breaker (see the crate-level docs).

use std::sync::OnceLock;

/// A fatal condition raised by the logging core.
///
/// All variants are routed through the installed [error hook](set_error_hook).
/// The hook is expected to terminate the process; if it returns, the
/// operation that raised the error is treated as a no-op (the event is
/// dropped, the registration doesn't happen, and so on).
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[non_exhaustive]
pub enum LogError {
    /// A producer called [`LocalLogger::record`](crate::LocalLogger::record)
    /// while all `N` arenas were already full and awaiting the consumer.
    #[error("logger full: all {arenas} arenas are awaiting drain")]
    LoggerFull {
        /// The logger's arena count (`N`).
        arenas: usize,
    },

    /// A single record did not fit into an empty arena.
    #[error("entry of {entry_size} bytes does not fit in an empty buffer of {capacity} bytes")]
    EntryTooLarge {
        /// Aligned footprint of the record that was rejected.
        entry_size: usize,
        /// Capacity of a single arena (`B`).
        capacity: usize,
    },

    /// [`LocalLogger::advance`](crate::LocalLogger) ran before the logger had
    /// been [`register`](crate::LogServer::register)ed with a server.
    #[error("advance() reached before the logger was registered with a LogServer")]
    UnregisteredLogger,

    /// [`LogServer::register`](crate::LogServer::register) was called when
    /// the registry already held its configured maximum.
    #[error("register() called with {registered} loggers already registered (capacity {capacity})")]
    RegistryFull {
        /// Number of loggers already registered.
        registered: usize,
        /// The server's configured `maxLoggers`.
        capacity: usize,
    },

    /// The consumer's mini-semaphore `take()` ran when `puts == gets`.
    ///
    /// This indicates a bug in the core itself (`drain_one` is supposed to
    /// check `peek() > 0` before calling `take()`), not a producer/consumer
    /// usage error.
    #[error("mini-semaphore take() called with count already at zero")]
    SemaphoreUnderflow,

    /// A record's stored `size` walked the `drain` cursor past the end of
    /// the arena. The walk uses record-declared sizes only, so a corrupt
    /// size is unrecoverable once found (spec §4.1).
    #[error("corrupt record: size walk reached offset {offset} in a {capacity}-byte arena")]
    CorruptRecord {
        /// The offset the walk had reached when the overrun was detected.
        offset: usize,
        /// Capacity of the arena being drained (`B`).
        capacity: usize,
    },
}

/// A process-wide callback invoked with every [`LogError`].
pub type ErrorHook = dyn Fn(LogError) + Send + Sync + 'static;

static ERROR_HOOK: OnceLock<Box<ErrorHook>> = OnceLock::new();

/// Installs the process-wide error hook.
///
/// Only the first call has any effect -- later calls are ignored and return
/// `false` -- matching the documented pattern of installing the hook once at
/// program start (spec §9: "a configurable static callable installed at
/// program start").
pub fn set_error_hook<F>(hook: F) -> bool
where
    F: Fn(LogError) + Send + Sync + 'static,
{
    ERROR_HOOK.set(Box::new(hook)).is_ok()
}

/// Returns the installed error hook, installing the default one
/// (format to stderr, then panic) on first use.
pub(crate) fn error_hook() -> &'static ErrorHook {
    ERROR_HOOK
        .get_or_init(|| Box::new(default_error_hook))
        .as_ref()
}

fn default_error_hook(err: LogError) {
    panic!("quicklog: fatal logging error: {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let msg = format!("{}", LogError::LoggerFull { arenas: 8 });
        assert!(msg.contains('8'));

        let msg = format!(
            "{}",
            LogError::EntryTooLarge {
                entry_size: 128,
                capacity: 64
            }
        );
        assert!(msg.contains("128") && msg.contains("64"));
    }
}
