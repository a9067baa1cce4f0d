//! The capture arena: a fixed-size byte region holding a contiguous sequence
//! of self-describing records (spec §3/§4.1).

use std::mem;
use std::ptr;

use crate::dispatch::{PrintFn, RecordArgs};
use crate::error::{error_hook, LogError};

/// Maximum scalar alignment the arena guarantees for every record's start
/// offset, so that casting the bytes at any such offset to a [`RecordHeader`]
/// is defined behavior (spec §4.1).
const ARENA_ALIGN: usize = 16;

/// `(size_in_bytes, reprint_thunk)` stored immediately before a record's
/// payload bytes (spec §3 Record).
///
/// `size` is the aligned footprint of the whole record (header + payload +
/// padding) -- `drain` advances by this value alone, never by recomputing
/// anything from the payload's type, matching "the walk uses
/// record-declared sizes only" (spec §4.1).
#[repr(C)]
struct RecordHeader {
    size: u32,
    reprint: ReprintThunk,
}

/// A function pointer to a monomorphized reprint routine: one distinct
/// compiled body per `A: RecordArgs` used at any `record()` call site in the
/// program, all coercing to this single non-generic pointer type so a
/// `CaptureArena` can hold records of different argument-type packs
/// side by side (spec §9, "Polymorphic record without heap or virtual
/// tables").
type ReprintThunk = unsafe fn(*const u8, &PrintFn);

/// Decodes the payload at `payload` as `A` and hands it to `print`.
///
/// # Safety
///
/// `payload` must point to at least `size_of::<A>()` readable bytes written
/// by a previous `ptr::copy_nonoverlapping` of a live `A` value (see
/// [`CaptureArena::try_push`]).
unsafe fn reprint_shim<A: RecordArgs>(payload: *const u8, print: &PrintFn) {
    let bytes = std::slice::from_raw_parts(payload, mem::size_of::<A>());
    let args = A::read_from(bytes);
    print(&args);
}

const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// A fixed-capacity, bump-allocated byte region holding a sequence of
/// records (spec §3 Capture Arena).
///
/// `B` is the arena's capacity in bytes. The backing storage is laid out
/// first and aligned to [`ARENA_ALIGN`] so every record's start offset
/// shares that alignment.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub struct CaptureArena<const B: usize> {
    bytes: [u8; B],
    /// Bytes used. Always a multiple of [`ARENA_ALIGN`].
    pos: u32,
    /// Records written since the last `drain`.
    count: u32,
}

impl<const B: usize> CaptureArena<B> {
    /// An empty arena.
    pub const fn new() -> Self {
        Self {
            bytes: [0; B],
            pos: 0,
            count: 0,
        }
    }

    /// `pos == 0`: no record is currently held.
    pub fn empty(&self) -> bool {
        self.pos == 0
    }

    /// Attempts to append `args` as a new record.
    ///
    /// Returns `false` without mutating any state if `args`'s aligned
    /// footprint does not fit in the remaining space (spec §4.1: "return
    /// failure without partial writes").
    pub fn try_push<A: RecordArgs>(&mut self, args: A) -> bool {
        let header_size = mem::size_of::<RecordHeader>();
        let payload_size = mem::size_of::<A>();
        let footprint = align_up(header_size + payload_size, ARENA_ALIGN);

        if self.pos as usize + footprint > B {
            return false;
        }

        // SAFETY: `footprint` bytes starting at `pos` are within `bytes`
        // (checked above), `pos` is always a multiple of `ARENA_ALIGN` so
        // the `RecordHeader` write below is aligned, and `args` is `Copy`
        // so copying its bytes elsewhere and later reading them back as a
        // fresh `A` recovers an equivalent value.
        unsafe {
            let base = self.bytes.as_mut_ptr().add(self.pos as usize);
            (base as *mut RecordHeader).write(RecordHeader {
                size: footprint as u32,
                reprint: reprint_shim::<A>,
            });
            let payload_ptr = base.add(header_size);
            ptr::copy_nonoverlapping(&args as *const A as *const u8, payload_ptr, payload_size);
        }

        self.pos += footprint as u32;
        self.count += 1;
        true
    }

    /// Walks every record in insertion order invoking its reprint routine
    /// against `print`, then resets the arena to empty (spec §4.1).
    ///
    /// Only ever called by the consumer thread, after the producer has
    /// handed this arena off via `advance` (spec §3 Record lifetime).
    ///
    /// The walk trusts only record-declared sizes (spec §4.1: "never
    /// external metadata"), so a corrupt size is unrecoverable on its own --
    /// each step is bounds-checked against `B` before the stored header is
    /// read and before its `size` is trusted for the next step, and any
    /// violation is routed through the error hook instead of walking the
    /// pointer out of bounds.
    pub fn drain(&mut self, print: &PrintFn) {
        let header_size = mem::size_of::<RecordHeader>();
        let mut offset = 0usize;
        for _ in 0..self.count {
            if offset + header_size > B {
                error_hook()(LogError::CorruptRecord { offset, capacity: B });
                break;
            }

            // SAFETY: the bounds check above guarantees `header_size` bytes
            // at `offset` are within `bytes`, and `offset` was produced by
            // summing previously-written `RecordHeader::size` values (each
            // checked below before being trusted), so it lands on a live
            // header written by `try_push`.
            let size = unsafe {
                let header_ptr = self.bytes.as_ptr().add(offset) as *const RecordHeader;
                let header = &*header_ptr;
                let payload_ptr = self.bytes.as_ptr().add(offset + header_size);
                (header.reprint)(payload_ptr, print);
                header.size as usize
            };

            if offset + size > B {
                error_hook()(LogError::CorruptRecord { offset, capacity: B });
                break;
            }
            offset += size;
        }
        self.pos = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn try_push_rejects_when_full_without_partial_writes() {
        let mut arena: CaptureArena<48> = CaptureArena::new();
        assert!(arena.try_push(1u8));
        let pos_after_first = arena.pos;
        // A record this large cannot fit in the remainder.
        assert!(!arena.try_push([0u8; 64]));
        assert_eq!(arena.pos, pos_after_first, "rejected push must not mutate pos");
    }

    #[test]
    fn exact_fit_then_rollover() {
        // header is 16 bytes (u32 + fn ptr, rounded to 16-byte arena align),
        // so a zero-sized payload takes exactly one footprint of 16 bytes.
        let mut arena: CaptureArena<16> = CaptureArena::new();
        assert!(arena.try_push(()));
        assert!(
            !arena.try_push(()),
            "second record must not fit in a 16-byte, 1-record arena"
        );
    }

    #[test]
    fn drain_visits_records_in_order_and_resets() {
        let seen: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let print = |args: &dyn std::fmt::Debug| {
            seen.lock().unwrap().push(format!("{:?}", args));
        };

        let mut arena: CaptureArena<256> = CaptureArena::new();
        assert!(arena.try_push(0i32));
        assert!(arena.try_push(1i32));
        assert!(arena.try_push(2i32));
        assert!(!arena.empty());

        arena.drain(&print);

        assert!(arena.empty());
        assert_eq!(arena.count, 0);
        assert_eq!(&*seen.lock().unwrap(), &["0", "1", "2"]);
    }

    #[test]
    fn drain_routes_a_corrupt_record_size_through_the_error_hook_instead_of_reading_oob() {
        // The default hook panics; installing a silent one here (or letting
        // another test in this binary win the race to install one first, per
        // the shared-process-wide-hook caveat documented in logger.rs's
        // tests) is what lets this test observe "did not panic" rather than
        // "which closure happened to run".
        let _ = crate::error::set_error_hook(|_| {});

        let mut arena: CaptureArena<64> = CaptureArena::new();
        assert!(arena.try_push(1i32));

        // Corrupt the just-written header's declared size so a blind walk
        // would read past the 64-byte arena.
        unsafe {
            let header_ptr = arena.bytes.as_mut_ptr() as *mut RecordHeader;
            (*header_ptr).size = 10_000;
        }

        let print = |_: &dyn std::fmt::Debug| {};
        arena.drain(&print);

        assert!(arena.empty(), "drain must still reset the arena after a corrupt record");
    }
}
