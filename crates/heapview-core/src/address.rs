//! Heap addresses and the null sentinel.

use std::fmt;

/// Alignment every host is expected to apply to the first usable address.
///
/// Because allocations are aligned to at least this many bytes, no valid
/// allocation ever starts at [`Address::NULL`].
pub const DEFAULT_ALIGNMENT: usize = 8;

/// A byte offset into the current heap buffer.
///
/// `Address(0)` is reserved: it means "no allocation" when returned by a
/// host and "freed" when held by a reference. Addresses are plain offsets,
/// not pointers, so they stay meaningful across buffer replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub usize);

impl Address {
    /// The null / freed sentinel.
    pub const NULL: Address = Address(0);

    /// Whether this is the null sentinel.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The raw byte offset.
    pub fn get(self) -> usize {
        self.0
    }

    /// Offset this address by `bytes`, or `None` on overflow.
    pub fn checked_add(self, bytes: usize) -> Option<Address> {
        self.0.checked_add(bytes).map(Address)
    }

    /// Whether this address is a multiple of `align` (which must be non-zero).
    pub fn is_aligned_to(self, align: usize) -> bool {
        self.0 % align == 0
    }

    /// Round `self` up to the next multiple of `align`, or `None` on overflow.
    ///
    /// `align` must be a power of two.
    pub fn align_up(self, align: usize) -> Option<Address> {
        debug_assert!(align.is_power_of_two());
        let mask = align - 1;
        self.0.checked_add(mask).map(|v| Address(v & !mask))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<usize> for Address {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

impl From<u32> for Address {
    fn from(v: u32) -> Self {
        Self(v as usize)
    }
}

impl From<Address> for usize {
    fn from(a: Address) -> Self {
        a.0
    }
}
