//! Low-level storage for heap buffers.
//!
//! The backing store is a boxed slice of `AtomicU64`, so it is 8-byte
//! aligned and every byte lives inside an `UnsafeCell`. Narrower cells are
//! handed out by reinterpreting an aligned sub-range of that storage as
//! `AtomicU8`/`AtomicU16`/`AtomicU32`. This is the only module in the
//! workspace allowed to use `unsafe`.

#![allow(unsafe_code)]

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

// Cell handout relies on the storage word being at least as aligned as the
// widest cell.
const _: () = assert!(std::mem::align_of::<AtomicU64>() == 8);

/// An atomic integer cell that can be projected out of raw heap storage.
///
/// # Safety
///
/// Implementors must have `size_of == align_of == WIDTH`, contain only an
/// `UnsafeCell` of an integer, and be valid for every bit pattern.
pub(crate) unsafe trait RawCell: Sync {
    /// Size and alignment of the cell in bytes.
    const WIDTH: usize;
}

// SAFETY: atomic integers have the size and alignment of their integer and
// accept any bit pattern.
unsafe impl RawCell for AtomicU8 {
    const WIDTH: usize = 1;
}
// SAFETY: as above.
unsafe impl RawCell for AtomicU16 {
    const WIDTH: usize = 2;
}
// SAFETY: as above.
unsafe impl RawCell for AtomicU32 {
    const WIDTH: usize = 4;
}
// SAFETY: as above.
unsafe impl RawCell for AtomicU64 {
    const WIDTH: usize = 8;
}

/// Zero-initialised, 8-byte aligned, shareable byte storage.
///
/// Once detached the storage reports a length of zero and hands out no
/// cells; the words themselves stay allocated until the last handle drops.
pub(crate) struct RawHeap {
    words: Box<[AtomicU64]>,
    byte_len: usize,
    detached: AtomicBool,
}

impl RawHeap {
    /// Allocate `byte_len` zeroed bytes. `byte_len` must be a multiple of 8.
    pub(crate) fn zeroed(byte_len: usize) -> Self {
        debug_assert_eq!(byte_len % 8, 0);
        let words = (0..byte_len / 8).map(|_| AtomicU64::new(0)).collect();
        Self {
            words,
            byte_len,
            detached: AtomicBool::new(false),
        }
    }

    /// Length of the storage in bytes, or 0 once detached.
    #[inline]
    pub(crate) fn byte_len(&self) -> usize {
        if self.detached.load(Ordering::Acquire) {
            0
        } else {
            self.byte_len
        }
    }

    /// Stop handing out cells.
    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Whether [`detach`](Self::detach) has been called.
    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    /// The `index`-th cell of type `C`, or `None` if it lies past the end.
    ///
    /// Cells are indexed in units of `C::WIDTH`, so every returned cell is
    /// naturally aligned.
    #[inline]
    pub(crate) fn cell<C: RawCell>(&self, index: usize) -> Option<&C> {
        let offset = index.checked_mul(C::WIDTH)?;
        let end = offset.checked_add(C::WIDTH)?;
        if end > self.byte_len() {
            return None;
        }
        let base = self.words.as_ptr().cast::<u8>();
        // SAFETY: `offset + WIDTH <= byte_len() <= self.byte_len`, so the
        // cell lies inside the boxed slice. `offset` is a multiple of `WIDTH`
        // and the base is 8-byte aligned, so the pointer is aligned for `C`.
        // Every byte sits in an `UnsafeCell` and is only ever touched through
        // atomics, so no non-atomic write can alias the cell. The reference
        // borrows `self`, which keeps the storage alive.
        //
        // This does not make racing accesses of *different* widths to the
        // same bytes well defined: the memory model leaves those
        // unspecified. Callers must keep concurrent accesses to a cell at
        // one width (see `HeapBuffer`).
        Some(unsafe { &*base.add(offset).cast::<C>() })
    }
}
