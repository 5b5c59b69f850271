//! References to fixed-length arrays of elements.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;

use heapview_buffer::{Access, Element, Generation, TypedView};
use heapview_core::{Address, HeapError};

use crate::handle::{heap_ref, Handle};
use crate::pointer::{Ptr32, Ptr64, PointerFlavor};

/// A reference to `len` consecutive `K`s. Unlike a string, an array has no
/// terminator.
pub struct ArrayRef<'m, K: Element> {
    pub(crate) handle: Handle<'m>,
    len: usize,
    _kind: PhantomData<K>,
}

heap_ref!(ArrayRef<K: Element>);

impl<'m, K: Element> ArrayRef<'m, K> {
    pub(crate) fn new(handle: Handle<'m>, len: usize) -> Self {
        Self {
            handle,
            len,
            _kind: PhantomData,
        }
    }

    /// Number of elements. Fixed at creation.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
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

    /// Copy every element out of the heap.
    pub fn to_vec(&self) -> Result<Vec<K>, HeapError> {
        let (generation, elements) = self.locate()?;
        generation.view::<K>().to_vec(elements)
    }

    /// Copy `values` into the leading elements.
    pub fn copy_from_slice(&self, values: &[K]) -> Result<(), HeapError> {
        if values.len() > self.len {
            return Err(HeapError::CapacityExceeded {
                required: values.len(),
                capacity: self.len,
            });
        }
        let (generation, elements) = self.locate()?;
        generation.view::<K>().copy_from_slice(elements.start, values)
    }

    /// Set every element to `value`.
    pub fn fill(&self, value: K) -> Result<(), HeapError> {
        let (generation, elements) = self.locate()?;
        generation.view::<K>().fill(elements, value)
    }

    /// Iterate over the elements with plain reads from the current
    /// generation.
    pub fn iter(&self) -> Result<ArrayIter<K>, HeapError> {
        let (generation, elements) = self.locate()?;
        Ok(ArrayIter {
            generation,
            next: elements.start,
            end: elements.end,
            _kind: PhantomData,
        })
    }

    /// A view of the elements in the current generation.
    ///
    /// The view borrows the array, so the array cannot be freed while the
    /// view exists. It does not follow later buffer replacement.
    pub fn view(&self) -> Result<ArrayView<'_, K>, HeapError> {
        let (generation, elements) = self.locate()?;
        Ok(ArrayView {
            generation,
            start: elements.start,
            len: self.len,
            _array: PhantomData,
        })
    }

    /// The current generation and the element indices the array covers.
    fn locate(&self) -> Result<(Arc<Generation>, Range<usize>), HeapError> {
        let address = self.handle.live()?;
        let generation = self.handle.manager().generation();
        let start = TypedView::<K>::index_of(address);
        match start.checked_add(self.len) {
            Some(end) => Ok((generation, start..end)),
            None => Err(self.unreachable(address, self.len, &generation)),
        }
    }

    fn element_index(&self, index: usize) -> Result<usize, HeapError> {
        let address = self.handle.live()?;
        if index >= self.len {
            return Err(HeapError::invalid(format!(
                "index {index} out of range for array of length {}",
                self.len
            )));
        }
        TypedView::<K>::index_of(address)
            .checked_add(index)
            .ok_or_else(|| self.unreachable(address, index, &self.handle.manager().generation()))
    }

    fn unreachable(&self, address: Address, count: usize, generation: &Generation) -> HeapError {
        HeapError::OutOfBounds {
            address,
            len: count.saturating_mul(K::WIDTH),
            buffer_len: generation.byte_len(),
        }
    }

    fn load(&self, index: usize, access: Access) -> Result<K, HeapError> {
        let element = self.element_index(index)?;
        self.handle.manager().generation().view::<K>().load(element, access)
    }

    fn store(&self, index: usize, value: K, access: Access) -> Result<(), HeapError> {
        let element = self.element_index(index)?;
        self.handle
            .manager()
            .generation()
            .view::<K>()
            .store(element, value, access)
    }
}

/// Element types that can hold heap addresses.
pub trait AddressCell: Element {
    /// Interpret the element as an address.
    fn to_address(self) -> Result<Address, HeapError>;
}

impl AddressCell for u32 {
    fn to_address(self) -> Result<Address, HeapError> {
        Ptr32::decode(self)
    }
}

impl AddressCell for u64 {
    fn to_address(self) -> Result<Address, HeapError> {
        Ptr64::decode(self)
    }
}

/// Options for [`ArrayRef::free_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrayFree {
    /// Also deallocate every non-null address stored in the array, in
    /// index order, before the array itself.
    pub free_elements: bool,
}

impl<K: AddressCell> ArrayRef<'_, K> {
    /// Free the array, optionally freeing every address it holds first.
    ///
    /// All elements are read before anything is deallocated. No-op if the
    /// array is already freed.
    pub fn free_with(&mut self, options: ArrayFree) -> Result<(), HeapError> {
        if self.handle.live().is_err() {
            return Ok(());
        }
        if options.free_elements {
            let targets = self
                .to_vec()?
                .into_iter()
                .map(K::to_address)
                .collect::<Result<Vec<_>, _>>()?;
            for target in targets.into_iter().filter(|a| !a.is_null()) {
                self.handle.manager().deallocate(target);
            }
        }
        self.handle.free();
        Ok(())
    }
}

impl<K: Element> fmt::Debug for ArrayRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("kind", &K::KIND)
            .field("len", &self.len)
            .field("address", &self.handle.address())
            .finish()
    }
}

/// A generation-pinned window onto a live array's elements.
pub struct ArrayView<'a, K: Element> {
    generation: Arc<Generation>,
    start: usize,
    len: usize,
    _array: PhantomData<&'a K>,
}

impl<K: Element> ArrayView<'_, K> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Plain read of element `index`, or `None` out of range.
    pub fn get(&self, index: usize) -> Option<K> {
        if index < self.len {
            self.generation.view::<K>().get(self.start + index)
        } else {
            None
        }
    }

    /// Plain write of element `index`.
    pub fn set(&self, index: usize, value: K) -> Result<(), HeapError> {
        if index >= self.len {
            return Err(HeapError::invalid(format!(
                "index {index} out of range for view of length {}",
                self.len
            )));
        }
        self.generation.view::<K>().write(self.start + index, value)
    }

    /// Copy the elements out.
    pub fn to_vec(&self) -> Result<Vec<K>, HeapError> {
        self.generation
            .view::<K>()
            .to_vec(self.start..self.start + self.len)
    }

    /// The generation the view reads from.
    pub fn generation_number(&self) -> u64 {
        self.generation.number()
    }
}

/// Iterator returned by [`ArrayRef::iter`].
///
/// Ends early, and for good, if the pinned buffer is detached.
pub struct ArrayIter<K: Element> {
    generation: Arc<Generation>,
    next: usize,
    end: usize,
    _kind: PhantomData<K>,
}

impl<K: Element> Iterator for ArrayIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        if self.next >= self.end {
            return None;
        }
        match self.generation.view::<K>().get(self.next) {
            Some(value) => {
                self.next += 1;
                Some(value)
            }
            // Detached mid-iteration.
            None => {
                self.next = self.end;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HeapRef;
    use crate::manager::HeapManager;
    use heapview_test_utils::BumpHost;

    fn manager() -> HeapManager {
        HeapManager::with_defaults(BumpHost::new(256)).unwrap()
    }

    #[test]
    fn iter_yields_every_element_in_order() {
        let m = manager();
        let a = m.alloc_array_from(&[3i16, -1, 7]).unwrap();
        let mut it = a.iter().unwrap();
        assert_eq!(it.size_hint(), (3, Some(3)));
        assert_eq!(it.next(), Some(3));
        assert_eq!(it.size_hint(), (2, Some(2)));
        assert_eq!(it.collect::<Vec<_>>(), vec![-1, 7]);
        let empty = m.wrap_array::<u8>(Address(8), 0).unwrap();
        assert_eq!(empty.iter().unwrap().count(), 0);
    }

    #[test]
    fn iter_stops_when_the_buffer_detaches() {
        let m = manager();
        let a = m.alloc_array_from(&[1u32, 2, 3]).unwrap();
        let mut it = a.iter().unwrap();
        assert_eq!(it.next(), Some(1));
        m.buffer().detach();
        assert_eq!(it.next(), None);
        assert_eq!(it.size_hint(), (0, Some(0)));
    }

    #[test]
    fn view_set_writes_through_to_the_array() {
        let m = manager();
        let a = m.alloc_array::<f32>(4).unwrap();
        let view = a.view().unwrap();
        view.set(2, 1.5).unwrap();
        assert_eq!(view.get(2), Some(1.5));
        assert_eq!(a.read(2).unwrap(), 1.5);
        assert_eq!(view.to_vec().unwrap(), vec![0.0, 0.0, 1.5, 0.0]);
        assert!(matches!(
            view.set(4, 9.0),
            Err(HeapError::InvalidArgument { .. })
        ));
        assert_eq!(view.get(4), None);
        assert_eq!(view.generation_number(), m.generation_number());
    }

    #[test]
    fn index_past_the_end_is_rejected() {
        let m = manager();
        let a = m.alloc_array::<u64>(2).unwrap();
        assert!(matches!(a.write(2, 1), Err(HeapError::InvalidArgument { .. })));
        assert!(matches!(
            a.copy_from_slice(&[1, 2, 3]),
            Err(HeapError::CapacityExceeded { required: 3, capacity: 2 })
        ));
        a.copy_from_slice(&[5]).unwrap();
        assert_eq!(a.to_vec().unwrap(), vec![5, 0]);
    }

    #[test]
    fn oversized_wraps_fail_instead_of_overflowing() {
        let m = manager();
        assert!(matches!(
            m.wrap_array::<u8>(Address(8), usize::MAX),
            Err(HeapError::InvalidArgument { .. })
        ));
        assert!(m.wrap_array::<u16>(Address(8), usize::MAX / 2).is_err());

        // Fits the address space but not the heap: every access is an error.
        let a = m.wrap_array::<u8>(Address(8), usize::MAX - 8).unwrap();
        assert!(matches!(
            a.read(usize::MAX - 9),
            Err(HeapError::OutOfBounds { .. })
        ));
        assert!(a.to_vec().is_err());
        assert!(a.fill(1).is_err());
        assert!(a.view().unwrap().to_vec().is_err());
    }

    #[test]
    fn freed_arrays_reject_access() {
        let m = manager();
        let mut a = m.alloc_array::<i8>(3).unwrap();
        a.free();
        assert_eq!(
            a.read(0).unwrap_err(),
            HeapError::UseAfterFree { reference: "array" }
        );
        assert!(a.iter().is_err());
        assert!(a.view().is_err());
        assert_eq!(a.len(), 3);
    }
}
