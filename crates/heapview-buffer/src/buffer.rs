//! Shared heap buffers.
//!
//! A [`HeapBuffer`] is a cheap-to-clone handle to one instance of heap
//! storage. Clones share bytes and identity; [`HeapBuffer::grown`] produces
//! a *new* instance, which is how embedders model growth that replaces the
//! buffer underneath existing views. A host that moves to a new instance
//! may [`detach`](HeapBuffer::detach) the old one, after which every handle
//! to it reports a length of zero.
//!
//! Byte-level operations ([`HeapBuffer::fill`], [`HeapBuffer::write_bytes`],
//! [`HeapBuffer::read_bytes`], [`HeapBuffer::grown`]) go one `u8` cell at a
//! time, so they may race other agents' byte accesses but not wider ones.

use std::fmt;
use std::sync::atomic::AtomicU8;
use std::sync::{Arc, OnceLock};

use heapview_core::{Address, HeapError};

use crate::atomic::Access;
use crate::raw::RawHeap;

/// Granularity every buffer length must respect: the widest element.
pub const BUFFER_GRANULE: usize = 8;

/// A contiguous, shareable byte region.
///
/// Zero-length buffers signal that the embedder's heap is detached. All
/// empty buffers returned by [`HeapBuffer::empty`] are the same instance.
///
/// # Concurrency
///
/// The buffer is `Send + Sync` and every access is atomic, but the Rust
/// memory model only orders atomic accesses of the same size to the same
/// bytes. Agents sharing a buffer must agree on one element width per
/// cell while they race on it: a `u32` store concurrent with a `u8` load of
/// one of its bytes is outside the model, even though no operation here
/// is unsound on its own. Mixed widths are fine once the accesses are
/// ordered, e.g. by a thread join.
#[derive(Clone)]
pub struct HeapBuffer {
    raw: Arc<RawHeap>,
}

impl HeapBuffer {
    /// Allocate a zeroed buffer of `byte_len` bytes.
    ///
    /// `byte_len` must be a multiple of [`BUFFER_GRANULE`] so that every
    /// typed view covers the buffer exactly.
    pub fn new(byte_len: usize) -> Result<Self, HeapError> {
        if byte_len % BUFFER_GRANULE != 0 {
            return Err(HeapError::invalid(format!(
                "buffer length {byte_len} is not a multiple of {BUFFER_GRANULE}"
            )));
        }
        if byte_len == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            raw: Arc::new(RawHeap::zeroed(byte_len)),
        })
    }

    /// The shared detached (zero-length) buffer.
    pub fn empty() -> Self {
        static EMPTY: OnceLock<Arc<RawHeap>> = OnceLock::new();
        Self {
            raw: Arc::clone(EMPTY.get_or_init(|| Arc::new(RawHeap::zeroed(0)))),
        }
    }

    /// Length of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.raw.byte_len()
    }

    /// Whether the buffer has no bytes (never had any, or was detached).
    pub fn is_empty(&self) -> bool {
        self.byte_len() == 0
    }

    /// Detach this instance: every handle to it now reports a length of
    /// zero and rejects all access. Irreversible.
    pub fn detach(&self) {
        self.raw.detach();
    }

    /// Whether [`detach`](Self::detach) has been called on this instance.
    pub fn is_detached(&self) -> bool {
        self.raw.is_detached()
    }

    /// Whether `self` and `other` are the same buffer instance.
    pub fn same_buffer(&self, other: &HeapBuffer) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
    }

    /// A new, larger buffer instance holding a copy of this one's bytes.
    ///
    /// `new_len` must be a multiple of [`BUFFER_GRANULE`] and at least the
    /// current length. The returned buffer is a different instance, so
    /// views built over `self` do not observe later writes to it. The copy
    /// is not a snapshot: bytes written concurrently may or may not make it.
    pub fn grown(&self, new_len: usize) -> Result<HeapBuffer, HeapError> {
        if new_len < self.byte_len() {
            return Err(HeapError::invalid(format!(
                "cannot grow a {}-byte buffer to {new_len} bytes",
                self.byte_len()
            )));
        }
        let next = HeapBuffer::new(new_len)?;
        let bytes = self.read_bytes(Address::NULL, self.byte_len())?;
        next.write_bytes(Address::NULL, &bytes)?;
        Ok(next)
    }

    /// Check that `[address, address + len)` lies inside the buffer.
    pub fn check_range(&self, address: Address, len: usize) -> Result<(), HeapError> {
        let in_bounds = address
            .checked_add(len)
            .is_some_and(|end| end.get() <= self.byte_len());
        if in_bounds {
            Ok(())
        } else {
            Err(HeapError::OutOfBounds {
                address,
                len,
                buffer_len: self.byte_len(),
            })
        }
    }

    /// Set every byte of `[address, address + len)` to `value`.
    pub fn fill(&self, address: Address, len: usize, value: u8) -> Result<(), HeapError> {
        self.check_range(address, len)?;
        let order = Access::Plain.ordering();
        for i in address.get()..address.get() + len {
            self.byte(i)?.store(value, order);
        }
        Ok(())
    }

    /// Copy `bytes` into the buffer starting at `address`.
    pub fn write_bytes(&self, address: Address, bytes: &[u8]) -> Result<(), HeapError> {
        self.check_range(address, bytes.len())?;
        let order = Access::Plain.ordering();
        for (i, &b) in bytes.iter().enumerate() {
            self.byte(address.get() + i)?.store(b, order);
        }
        Ok(())
    }

    /// Copy `len` bytes starting at `address` out of the buffer.
    pub fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>, HeapError> {
        self.check_range(address, len)?;
        let order = Access::Plain.ordering();
        (address.get()..address.get() + len)
            .map(|i| self.byte(i).map(|cell| cell.load(order)))
            .collect()
    }

    pub(crate) fn raw(&self) -> &RawHeap {
        &self.raw
    }

    // Callers check ranges first; this only fails if the buffer is
    // detached mid-operation.
    fn byte(&self, index: usize) -> Result<&AtomicU8, HeapError> {
        self.raw.cell::<AtomicU8>(index).ok_or(HeapError::OutOfBounds {
            address: Address(index),
            len: 1,
            buffer_len: self.byte_len(),
        })
    }
}

impl fmt::Debug for HeapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBuffer")
            .field("byte_len", &self.byte_len())
            .field("instance", &Arc::as_ptr(&self.raw))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buf = HeapBuffer::new(32).unwrap();
        assert_eq!(buf.byte_len(), 32);
        assert!(buf.read_bytes(Address(0), 32).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn length_must_be_a_multiple_of_eight() {
        assert!(matches!(
            HeapBuffer::new(12),
            Err(HeapError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn empties_share_identity() {
        let a = HeapBuffer::empty();
        let b = HeapBuffer::new(0).unwrap();
        assert!(a.is_empty());
        assert!(a.same_buffer(&b));
    }

    #[test]
    fn clones_share_bytes_and_identity() {
        let a = HeapBuffer::new(16).unwrap();
        let b = a.clone();
        a.write_bytes(Address(3), &[7, 8]).unwrap();
        assert!(a.same_buffer(&b));
        assert_eq!(b.read_bytes(Address(3), 2).unwrap(), vec![7, 8]);
    }

    #[test]
    fn grown_copies_into_a_new_instance() {
        let a = HeapBuffer::new(16).unwrap();
        a.write_bytes(Address(8), &[1, 2, 3]).unwrap();
        let b = a.grown(64).unwrap();
        assert!(!a.same_buffer(&b));
        assert_eq!(b.byte_len(), 64);
        assert_eq!(b.read_bytes(Address(8), 3).unwrap(), vec![1, 2, 3]);

        b.write_bytes(Address(0), &[9]).unwrap();
        assert_eq!(a.read_bytes(Address(0), 1).unwrap(), vec![0]);
    }

    #[test]
    fn detach_empties_every_handle() {
        let a = HeapBuffer::new(16).unwrap();
        let b = a.clone();
        let next = a.grown(32).unwrap();
        a.detach();
        assert!(b.is_empty());
        assert!(b.is_detached());
        assert!(b.read_bytes(Address(0), 1).is_err());
        assert!(!next.is_empty());
    }

    #[test]
    fn grown_rejects_shrinking() {
        let a = HeapBuffer::new(16).unwrap();
        assert!(a.grown(8).is_err());
    }

    #[test]
    fn fill_handles_unaligned_edges() {
        let buf = HeapBuffer::new(32).unwrap();
        buf.fill(Address(3), 19, 0xAB).unwrap();
        let bytes = buf.read_bytes(Address(0), 32).unwrap();
        for (i, &b) in bytes.iter().enumerate() {
            let expected = if (3..22).contains(&i) { 0xAB } else { 0 };
            assert_eq!(b, expected, "byte {i}");
        }
    }

    #[test]
    fn fill_inside_one_word() {
        let buf = HeapBuffer::new(16).unwrap();
        buf.fill(Address(1), 3, 5).unwrap();
        assert_eq!(
            buf.read_bytes(Address(0), 5).unwrap(),
            vec![0, 5, 5, 5, 0]
        );
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let buf = HeapBuffer::new(16).unwrap();
        let err = buf.write_bytes(Address(14), &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            HeapError::OutOfBounds {
                address: Address(14),
                len: 3,
                buffer_len: 16
            }
        );
        assert!(buf.check_range(Address(usize::MAX), 2).is_err());
        assert!(buf.check_range(Address(16), 0).is_ok());
    }
}
