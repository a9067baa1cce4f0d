//! Format dispatch glue: the mechanism that lets a [`CaptureArena`](crate::arena::CaptureArena)
//! hold arbitrarily-typed argument packs and reprint them later without
//! knowing their concrete type at the call site.
//!
//! [`RecordArgs`] is blanket-implemented for every `Copy + Debug` type,
//! which includes every tuple of `Copy + Debug` values via `core`'s own
//! blanket tuple `Debug` impls (arity 0 through 12) -- so a "argument pack"
//! is just whatever tuple (or single value) a producer passes to
//! [`record`](crate::LocalLogger::record); no per-arity code generation is
//! needed on our side. The one piece of actual codegen the design notes call
//! for -- "a function pointer to a monomorphized reprint routine generated
//! at the record call site, one routine per distinct argument-type pack" --
//! lives in [`crate::arena::reprint_shim`], which `rustc` monomorphizes once
//! per distinct `A: RecordArgs` automatically, the same way any other
//! generic function is monomorphized.

use std::fmt;
use std::mem;
use std::ptr;

/// A value (or tuple of values) that can be captured into a [`CaptureArena`](crate::arena::CaptureArena)
/// byte-for-byte and reconstructed later for printing.
///
/// Captured values must be trivially copyable and outlive the drain --
/// string literals are the canonical example. `Copy` rules out owned heap
/// data (`String`, `Vec<T>`, ...), but `&'a T` is `Copy` for any `'a`, so
/// `Copy` alone would let a short-lived borrow be captured and then read
/// back by the consumer after it expires. The `'static` bound closes that
/// gap: a record's bytes are reconstructed into a live `Self` on some later
/// call to `drain`, with no lifetime connecting that call back to the
/// original `record()` call.
pub trait RecordArgs: Copy + fmt::Debug + 'static {
    /// Reconstructs `Self` from its raw byte representation.
    ///
    /// `bytes` must contain at least `size_of::<Self>()` bytes written by a
    /// previous bitwise copy of a `Self` value (see
    /// `CaptureArena::try_push`). The read is unaligned because a record's
    /// payload offset, while always 16-byte aligned by construction, makes
    /// no promise about `Self`'s own alignment beyond that.
    fn read_from(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= mem::size_of::<Self>());
        // SAFETY: `bytes` is the exact byte image of a previously captured
        // `Self`, produced by `ptr::copy_nonoverlapping::<u8>` out of a live
        // `Self` value (see `CaptureArena::try_push`), so reinterpreting it
        // back as `Self` recovers the same bit pattern. `read_unaligned`
        // does not require `bytes.as_ptr()` to satisfy `Self`'s alignment.
        unsafe { ptr::read_unaligned(bytes.as_ptr() as *const Self) }
    }
}

impl<T: Copy + fmt::Debug + 'static> RecordArgs for T {}

/// The host-supplied print callable (spec §6).
///
/// Invoked by the consumer thread only, with the decoded argument pack for
/// one record, in the order it was captured. A single [`LogServer`](crate::LogServer)
/// owns one `PrintFn` and shares it across every logger it drains, so the
/// pack is passed as `&dyn Debug` rather than as its original concrete type
/// -- `Debug` is the one uniform, object-safe surface every `RecordArgs`
/// value already has, regardless of which distinct argument-type pack
/// produced it.
pub type PrintFn = dyn Fn(&dyn fmt::Debug) + Send + Sync + 'static;

/// Captures a tuple of heterogeneous values for use with
/// [`LocalLogger::record`](crate::LocalLogger::record), mirroring the
/// `printf`-like calling convention of spec §4.6 without requiring callers
/// to spell out a tuple themselves.
///
/// ```ignore
/// record!(logger, "connected", peer_id, retry_count);
/// ```
#[macro_export]
macro_rules! record {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.record(($($arg,)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars_and_tuples() {
        let mut buf = [0u8; 64];
        let value = 42i32;
        buf[..mem::size_of::<i32>()].copy_from_slice(&value.to_ne_bytes());
        assert_eq!(i32::read_from(&buf), 42);

        let tuple = (1u8, 2.5f64, "hi");
        let bytes = unsafe {
            std::slice::from_raw_parts(
                &tuple as *const _ as *const u8,
                mem::size_of_val(&tuple),
            )
        };
        let back = <(u8, f64, &str)>::read_from(bytes);
        assert_eq!(back.0, 1);
        assert_eq!(back.1, 2.5);
        assert_eq!(back.2, "hi");
    }
}
