//! Atomic access layer.
//!
//! Integer cells map directly onto the platform's atomic load/store. Types
//! without a native primitive are emulated so that each access is still
//! exactly one atomic memory operation:
//!
//! - `f32`/`f64`: the value is reinterpreted as a same-width unsigned
//!   integer (see [`heapview_core::bits`]) and stored, or loaded and
//!   reinterpreted back. The conversion happens outside the memory
//!   operation, so a reader never observes a half-written float.
//! - clamped `u8`: the value is saturated into `[0, 255]` first and the
//!   result is stored with a single `u8` store.
//!
//! All functions address cells by element index (`address / width`) and
//! return `None` when the cell lies past the end of the buffer.

use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

use heapview_core::BitPattern;

use crate::buffer::HeapBuffer;

/// How an element access synchronises with other agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// Ordinary access: untorn, but unordered relative to other cells.
    Plain,
    /// Sequentially consistent access.
    Atomic,
}

impl Access {
    /// The memory ordering used for this access mode.
    pub const fn ordering(self) -> Ordering {
        match self {
            Self::Plain => Ordering::Relaxed,
            Self::Atomic => Ordering::SeqCst,
        }
    }
}

macro_rules! integer_cell {
    ($load:ident, $store:ident, $int:ty, $atomic:ty) => {
        #[doc = concat!("Load the `index`-th `", stringify!($int), "` cell.")]
        #[inline]
        pub fn $load(buffer: &HeapBuffer, index: usize, access: Access) -> Option<$int> {
            buffer
                .raw()
                .cell::<$atomic>(index)
                .map(|cell| cell.load(access.ordering()))
        }

        #[doc = concat!("Store `value` into the `index`-th `", stringify!($int), "` cell.")]
        #[inline]
        pub fn $store(buffer: &HeapBuffer, index: usize, value: $int, access: Access) -> Option<()> {
            buffer
                .raw()
                .cell::<$atomic>(index)
                .map(|cell| cell.store(value, access.ordering()))
        }
    };
}

integer_cell!(load_u8, store_u8, u8, AtomicU8);
integer_cell!(load_u16, store_u16, u16, AtomicU16);
integer_cell!(load_u32, store_u32, u32, AtomicU32);
integer_cell!(load_u64, store_u64, u64, AtomicU64);

/// Load an `f32` through its 32-bit pattern.
#[inline]
pub fn load_f32(buffer: &HeapBuffer, index: usize, access: Access) -> Option<f32> {
    load_u32(buffer, index, access).map(f32::from_pattern)
}

/// Store an `f32` as its 32-bit pattern.
#[inline]
pub fn store_f32(buffer: &HeapBuffer, index: usize, value: f32, access: Access) -> Option<()> {
    store_u32(buffer, index, value.to_pattern(), access)
}

/// Load an `f64` through its 64-bit pattern.
#[inline]
pub fn load_f64(buffer: &HeapBuffer, index: usize, access: Access) -> Option<f64> {
    load_u64(buffer, index, access).map(f64::from_pattern)
}

/// Store an `f64` as its 64-bit pattern.
#[inline]
pub fn store_f64(buffer: &HeapBuffer, index: usize, value: f64, access: Access) -> Option<()> {
    store_u64(buffer, index, value.to_pattern(), access)
}

/// Saturate `value` into a byte: NaN becomes 0, out-of-range values pin to
/// the nearest bound, and fractions round half to even.
pub fn clamp_to_u8(value: f64) -> u8 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value.round_ties_even() as u8
    }
}

/// Clamp `value` into `[0, 255]`, then store it with one `u8` store.
#[inline]
pub fn store_clamped(buffer: &HeapBuffer, index: usize, value: f64, access: Access) -> Option<()> {
    store_u8(buffer, index, clamp_to_u8(value), access)
}
