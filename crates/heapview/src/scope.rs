//! Scoped allocation.
//!
//! A [`HeapScope`] tags every allocation made through it. Closing the scope
//! (explicitly or by dropping it) frees whatever the scope still owns, in
//! allocation order. References handed out by a scope borrow it, so the
//! borrow checker rejects any use of them after the scope has closed.

use heapview_buffer::{Element, Scalar};
use heapview_core::{Address, Encoding, HeapError};

use crate::array::ArrayRef;
use crate::manager::HeapManager;
use crate::number::NumberRef;
use crate::pointer::{PointerFlavor, PointerRef};
use crate::registry::{Allocation, ScopeId};
use crate::string::StringRef;

/// A group of allocations released together.
///
/// Created by [`HeapManager::scope`].
pub struct HeapScope<'m> {
    manager: &'m HeapManager,
    id: ScopeId,
    closed: bool,
}

impl<'m> HeapScope<'m> {
    pub(crate) fn new(manager: &'m HeapManager, id: ScopeId) -> Self {
        tracing::trace!(scope = %id, "scope opened");
        Self {
            manager,
            id,
            closed: false,
        }
    }

    /// The scope's identifier, as recorded in [`Allocation::scope`].
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Allocate `byte_size` raw bytes owned by the scope.
    pub fn alloc(&self, byte_size: usize) -> Result<Address, HeapError> {
        self.manager.allocate_in(byte_size, 1, Some(self.id))
    }

    /// Scoped [`HeapManager::alloc_number`].
    pub fn alloc_number<K: Scalar>(&self, value: K) -> Result<NumberRef<'_, K>, HeapError> {
        self.manager.alloc_number_in(Some(self.id), value)
    }

    /// Scoped [`HeapManager::alloc_pointer`].
    pub fn alloc_pointer<P: PointerFlavor>(
        &self,
        target: Address,
    ) -> Result<PointerRef<'_, P>, HeapError> {
        self.manager.alloc_pointer_in(Some(self.id), target)
    }

    /// Scoped [`HeapManager::alloc_array`].
    pub fn alloc_array<K: Element>(&self, len: usize) -> Result<ArrayRef<'_, K>, HeapError> {
        self.manager.alloc_array_in(Some(self.id), len)
    }

    /// Scoped [`HeapManager::alloc_array_from`].
    pub fn alloc_array_from<K: Element>(&self, values: &[K]) -> Result<ArrayRef<'_, K>, HeapError> {
        self.manager.alloc_array_from_in(Some(self.id), values)
    }

    /// Scoped [`HeapManager::alloc_string`].
    pub fn alloc_string(&self, encoding: Encoding, text: &str) -> Result<StringRef<'_>, HeapError> {
        self.manager.alloc_string_in(Some(self.id), encoding, text)
    }

    /// Scoped [`HeapManager::alloc_string_buffer`].
    pub fn alloc_string_buffer(
        &self,
        encoding: Encoding,
        capacity: usize,
    ) -> Result<StringRef<'_>, HeapError> {
        self.manager
            .alloc_string_buffer_in(Some(self.id), encoding, capacity)
    }

    /// Allocations the scope still owns, oldest first.
    pub fn live_allocations(&self) -> Vec<Allocation> {
        self.manager
            .live_allocations()
            .into_iter()
            .filter(|a| a.scope == Some(self.id))
            .collect()
    }

    /// Free everything the scope still owns and return how many regions
    /// were freed.
    pub fn close(mut self) -> usize {
        self.release()
    }

    fn release(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;
        let members = self.manager.registry.borrow_mut().drain_scope(self.id);
        for allocation in &members {
            self.manager.deallocate(allocation.address);
        }
        tracing::debug!(scope = %self.id, freed = members.len(), "scope closed");
        members.len()
    }
}

impl Drop for HeapScope<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for HeapScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapScope")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HeapRef;
    use heapview_test_utils::{BumpHost, RecordingHost};

    #[test]
    fn close_frees_members_in_allocation_order() {
        let (host, log) = RecordingHost::new(BumpHost::new(256));
        let m = HeapManager::with_defaults(host).unwrap();
        let outside = m.alloc(8).unwrap();
        let scope = m.scope();
        let a = scope.alloc(8).unwrap();
        let b = scope.alloc_number(7u32).unwrap().address();
        assert_eq!(scope.live_allocations().len(), 2);
        assert_eq!(scope.close(), 2);
        assert_eq!(log.deallocations(), vec![a, b]);
        let live: Vec<Address> = m.live_allocations().iter().map(|x| x.address).collect();
        assert_eq!(live, vec![outside]);
    }

    #[test]
    fn explicitly_freed_members_are_not_freed_again() {
        let (host, log) = RecordingHost::new(BumpHost::new(256));
        let m = HeapManager::with_defaults(host).unwrap();
        {
            let scope = m.scope();
            let mut s = scope.alloc_string(Encoding::Utf16, "hi").unwrap();
            let kept = scope.alloc_array::<u8>(4).unwrap().address();
            let freed = s.address();
            s.free();
            drop(s);
            drop(scope);
            assert_eq!(log.deallocations(), vec![freed, kept]);
        }
        assert_eq!(m.live_count(), 0);
    }

    #[test]
    fn scopes_are_independent() {
        let m = HeapManager::with_defaults(BumpHost::new(256)).unwrap();
        let outer = m.scope();
        let inner = m.scope();
        assert_ne!(outer.id(), inner.id());
        outer.alloc(8).unwrap();
        inner.alloc(8).unwrap();
        assert_eq!(inner.close(), 1);
        assert_eq!(outer.live_allocations().len(), 1);
    }
}
