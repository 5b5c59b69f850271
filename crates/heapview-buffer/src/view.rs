//! Fixed-width typed projections over a heap buffer.
//!
//! A [`TypedView`] interprets its buffer as `len = byte_len / width`
//! consecutive elements of `K`. Element `i` covers bytes
//! `[i * width, (i + 1) * width)`, so a byte address maps to element
//! `address / width` (addresses are truncated to the element grid, as a
//! typed-array projection would).

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use heapview_core::{Address, HeapError};

use crate::atomic::{self, Access};
use crate::buffer::HeapBuffer;
use crate::element::{Element, U8Clamped};

/// A view of a [`HeapBuffer`] as elements of `K`.
///
/// Views hold a shared handle to their buffer, so a view (and any
/// generation it belongs to) stays readable after the embedder replaces
/// the buffer; it simply stops observing new writes. If the embedder
/// detaches the old buffer the view's length drops to zero.
pub struct TypedView<K: Element> {
    buffer: HeapBuffer,
    _kind: PhantomData<K>,
}

impl<K: Element> Clone for TypedView<K> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Element> TypedView<K> {
    /// Project `buffer` as elements of `K`.
    pub fn new(buffer: &HeapBuffer) -> Self {
        Self {
            buffer: buffer.clone(),
            _kind: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.buffer.byte_len() / K::WIDTH
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &HeapBuffer {
        &self.buffer
    }

    /// Element index covering byte `address`.
    pub fn index_of(address: Address) -> usize {
        address.get() / K::WIDTH
    }

    /// Load element `index` with the given access mode.
    pub fn load(&self, index: usize, access: Access) -> Result<K, HeapError> {
        K::load(&self.buffer, index, access).ok_or_else(|| self.out_of_bounds(index, 1))
    }

    /// Store element `index` with the given access mode.
    pub fn store(&self, index: usize, value: K, access: Access) -> Result<(), HeapError> {
        K::store(&self.buffer, index, value, access).ok_or_else(|| self.out_of_bounds(index, 1))
    }

    /// Plain read of element `index`.
    pub fn read(&self, index: usize) -> Result<K, HeapError> {
        self.load(index, Access::Plain)
    }

    /// Plain write of element `index`.
    pub fn write(&self, index: usize, value: K) -> Result<(), HeapError> {
        self.store(index, value, Access::Plain)
    }

    /// Sequentially consistent read of element `index`.
    pub fn read_atomic(&self, index: usize) -> Result<K, HeapError> {
        self.load(index, Access::Atomic)
    }

    /// Sequentially consistent write of element `index`.
    pub fn write_atomic(&self, index: usize, value: K) -> Result<(), HeapError> {
        self.store(index, value, Access::Atomic)
    }

    /// Plain read, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<K> {
        K::load(&self.buffer, index, Access::Plain)
    }

    /// Copy the elements in `range` out of the heap.
    pub fn to_vec(&self, range: Range<usize>) -> Result<Vec<K>, HeapError> {
        self.check(range.clone())?;
        range.map(|i| self.read(i)).collect()
    }

    /// Copy `src` into consecutive elements starting at `start`.
    pub fn copy_from_slice(&self, start: usize, src: &[K]) -> Result<(), HeapError> {
        let end = start
            .checked_add(src.len())
            .ok_or_else(|| self.out_of_bounds(start, src.len()))?;
        self.check(start..end)?;
        for (i, &v) in src.iter().enumerate() {
            self.write(start + i, v)?;
        }
        Ok(())
    }

    /// Set every element in `range` to `value`.
    pub fn fill(&self, range: Range<usize>, value: K) -> Result<(), HeapError> {
        self.check(range.clone())?;
        for i in range {
            self.write(i, value)?;
        }
        Ok(())
    }

    /// Index of the first element in `range` equal to `value`, if any.
    pub fn position(&self, range: Range<usize>, value: K) -> Result<Option<usize>, HeapError> {
        self.check(range.clone())?;
        for i in range {
            if self.read(i)? == value {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    // Range checks up front keep a failing bulk operation from writing a
    // partial prefix. A concurrent detach can still cut one short.
    fn check(&self, range: Range<usize>) -> Result<(), HeapError> {
        if range.start <= range.end && range.end <= self.len() {
            Ok(())
        } else {
            Err(self.out_of_bounds(range.start, range.end.saturating_sub(range.start)))
        }
    }

    fn out_of_bounds(&self, index: usize, count: usize) -> HeapError {
        HeapError::OutOfBounds {
            address: Address(index.saturating_mul(K::WIDTH)),
            len: count.saturating_mul(K::WIDTH),
            buffer_len: self.buffer.byte_len(),
        }
    }
}

impl TypedView<U8Clamped> {
    /// Saturate `value` into `[0, 255]` and store it at `index`.
    pub fn store_clamped(&self, index: usize, value: f64, access: Access) -> Result<(), HeapError> {
        atomic::store_clamped(&self.buffer, index, value, access)
            .ok_or_else(|| self.out_of_bounds(index, 1))
    }
}

impl<K: Element> fmt::Debug for TypedView<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedView")
            .field("kind", &K::KIND)
            .field("len", &self.len())
            .finish()
    }
}
