//! Capabilities an embedder supplies.
//!
//! The embedder owns the heap: it decides where allocations go, when the
//! buffer grows, and when it is replaced. This crate only ever asks.

use heapview_core::{Address, AllocError};

use crate::buffer::HeapBuffer;

/// Something that can report the authoritative current heap buffer.
pub trait BufferSource {
    /// The current buffer. A zero-length buffer means "still detached".
    fn current_buffer(&self) -> HeapBuffer;
}

/// The full embedder capability set: buffer, allocate, deallocate.
///
/// Hosts are not assumed to be thread-safe or reentrant; a manager calls
/// them from a single thread and never while another host call is in
/// progress.
pub trait HeapHost: BufferSource {
    /// Reserve `byte_size` bytes and return the start address.
    ///
    /// The address must be valid in the buffer that
    /// [`current_buffer`](BufferSource::current_buffer) returns afterwards,
    /// and must never be [`Address::NULL`]. The host may grow (replace) the
    /// buffer as a side effect.
    fn allocate(&mut self, byte_size: usize) -> Result<Address, AllocError>;

    /// Release a region previously returned by `allocate`.
    ///
    /// Behaviour on double free or unknown addresses is host-defined.
    fn deallocate(&mut self, address: Address);
}

/// A fixed buffer is its own source.
impl BufferSource for HeapBuffer {
    fn current_buffer(&self) -> HeapBuffer {
        self.clone()
    }
}

impl<T: BufferSource + ?Sized> BufferSource for Box<T> {
    fn current_buffer(&self) -> HeapBuffer {
        (**self).current_buffer()
    }
}
