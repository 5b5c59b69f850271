//! References to null-terminated strings.

use std::fmt;

use heapview_buffer::Access;
use heapview_codec::{encoded_len, read_terminated, write_terminated};
use heapview_core::{Encoding, HeapError};

use crate::handle::{heap_ref, Handle};
use crate::span;

/// A reference to a fixed-capacity, null-terminated string.
///
/// Capacity is counted in code units of the encoding and includes the
/// terminator, so a string of capacity `n` holds at most `n - 1` units of
/// text.
pub struct StringRef<'m> {
    pub(crate) handle: Handle<'m>,
    encoding: Encoding,
    capacity: usize,
}

heap_ref!(StringRef);

impl<'m> StringRef<'m> {
    pub(crate) fn new(handle: Handle<'m>, encoding: Encoding, capacity: usize) -> Self {
        Self {
            handle,
            encoding,
            capacity,
        }
    }

    /// Units needed to store `text` in `encoding`, terminator included.
    pub fn capacity_for(encoding: Encoding, text: &str) -> usize {
        encoded_len(encoding, text) + 1
    }

    /// The string's encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Capacity in units, terminator included. Fixed at creation.
    pub fn allocated_element_count(&self) -> usize {
        self.capacity
    }

    /// Units before the terminator.
    pub fn encoded_element_count(&self) -> Result<usize, HeapError> {
        let address = self.handle.live()?;
        let generation = self.handle.manager().generation();
        span::with_units(
            &generation,
            address,
            self.encoding,
            Some(self.capacity),
            Access::Plain,
            |units| span::terminator(&*units, None, address),
        )?
    }

    /// Plain read of the text.
    pub fn read(&self) -> Result<String, HeapError> {
        self.load(Access::Plain)
    }

    /// Plain write of `text` and a terminator. Fails with
    /// [`HeapError::CapacityExceeded`], writing nothing, if it does not
    /// fit.
    pub fn write(&self, text: &str) -> Result<(), HeapError> {
        self.store(text, Access::Plain)
    }

    /// Read the text with one sequentially consistent load per unit.
    pub fn read_atomic(&self) -> Result<String, HeapError> {
        self.load(Access::Atomic)
    }

    /// Write the text with one sequentially consistent store per unit.
    pub fn write_atomic(&self, text: &str) -> Result<(), HeapError> {
        self.store(text, Access::Atomic)
    }

    fn load(&self, access: Access) -> Result<String, HeapError> {
        let address = self.handle.live()?;
        let generation = self.handle.manager().generation();
        span::with_units(
            &generation,
            address,
            self.encoding,
            Some(self.capacity),
            access,
            |units| read_terminated(self.encoding, &*units, None, address),
        )?
    }

    fn store(&self, text: &str, access: Access) -> Result<(), HeapError> {
        let address = self.handle.live()?;
        let generation = self.handle.manager().generation();
        span::with_units(
            &generation,
            address,
            self.encoding,
            Some(self.capacity),
            access,
            |units| write_terminated(self.encoding, text, units).map(drop),
        )?
    }
}

impl fmt::Debug for StringRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringRef")
            .field("encoding", &self.encoding)
            .field("capacity", &self.capacity)
            .field("address", &self.handle.address())
            .finish()
    }
}
