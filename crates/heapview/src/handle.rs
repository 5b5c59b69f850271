//! The capability set every reference shares, and the handle behind it.
//!
//! A reference is an address plus a borrow of its manager. The address
//! doubles as the liveness flag: [`Address::NULL`] means freed, so a
//! reference carries no state beyond what it needs to reach the heap.
//!
//! # Lifecycle
//!
//! ```text
//! Live(address) ── free() ──▶ Freed(NULL)
//!      │                        │
//!      └─ drop (reclaim on) ─▶  deallocated once
//! ```
//!
//! `free()` on a freed reference is a no-op; every other operation on a
//! freed reference fails with [`HeapError::UseAfterFree`].

use heapview_core::{Address, HeapError};

use crate::manager::HeapManager;

/// Operations common to every reference type.
///
/// Object safe, so heterogeneous references can be freed through
/// `&mut dyn HeapRef` (see [`HeapManager::free_ref`]).
pub trait HeapRef {
    /// Short name of the reference type, e.g. `"array"`.
    fn kind(&self) -> &'static str;

    /// Start of the referenced region, or [`Address::NULL`] once freed.
    fn address(&self) -> Address;

    /// Bytes spanned by the reference.
    fn allocated_byte_count(&self) -> usize;

    /// Deallocate the region. No-op if already freed.
    fn free(&mut self);

    /// Zero every byte of the region.
    fn clear(&self) -> Result<(), HeapError>;

    /// Whether [`free`](HeapRef::free) has been called.
    fn is_freed(&self) -> bool {
        self.address().is_null()
    }
}

/// Address, byte span, and manager borrow shared by all references.
pub(crate) struct Handle<'m> {
    manager: &'m HeapManager,
    address: Address,
    byte_size: usize,
    kind: &'static str,
    /// Allocated through the gateway, so eligible for reclaim on drop.
    owned: bool,
}

impl<'m> Handle<'m> {
    /// A handle over memory the gateway just allocated.
    pub(crate) fn owned(
        manager: &'m HeapManager,
        address: Address,
        byte_size: usize,
        kind: &'static str,
    ) -> Self {
        Self {
            manager,
            address,
            byte_size,
            kind,
            owned: true,
        }
    }

    /// A handle over memory the caller already owns.
    pub(crate) fn wrapped(
        manager: &'m HeapManager,
        address: Address,
        byte_size: usize,
        kind: &'static str,
    ) -> Result<Self, HeapError> {
        if address.is_null() {
            return Err(HeapError::invalid(format!("cannot wrap a {kind} at the null address")));
        }
        if address.get().checked_add(byte_size).is_none() {
            return Err(HeapError::invalid(format!(
                "{kind} of {byte_size} bytes at {address} runs past the address space"
            )));
        }
        Ok(Self {
            manager,
            address,
            byte_size,
            kind,
            owned: false,
        })
    }

    pub(crate) fn manager(&self) -> &'m HeapManager {
        self.manager
    }

    pub(crate) fn kind(&self) -> &'static str {
        self.kind
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// The address, or `UseAfterFree` if freed.
    #[inline]
    pub(crate) fn live(&self) -> Result<Address, HeapError> {
        if self.address.is_null() {
            Err(HeapError::UseAfterFree {
                reference: self.kind,
            })
        } else {
            Ok(self.address)
        }
    }

    pub(crate) fn free(&mut self) {
        let address = std::mem::replace(&mut self.address, Address::NULL);
        if !address.is_null() {
            self.manager.deallocate(address);
        }
    }

    pub(crate) fn clear(&self) -> Result<(), HeapError> {
        let address = self.live()?;
        self.manager.fill_bytes(address, self.byte_size, 0)
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        if self.owned && !self.address.is_null() && self.manager.config().reclaim_on_drop {
            tracing::trace!(address = %self.address, kind = self.kind, "reclaiming on drop");
            self.free();
        }
    }
}

/// Implements [`HeapRef`] for a reference type with a `handle` field.
macro_rules! heap_ref {
    ($ty:ident $(<$($param:ident $(: $bound:path)?),*>)?) => {
        impl<'m $($(, $param $(: $bound)?)*)?> $crate::HeapRef for $ty<'m $($(, $param)*)?> {
            fn kind(&self) -> &'static str {
                self.handle.kind()
            }

            fn address(&self) -> heapview_core::Address {
                self.handle.address()
            }

            fn allocated_byte_count(&self) -> usize {
                self.handle.byte_size()
            }

            fn free(&mut self) {
                self.handle.free();
            }

            fn clear(&self) -> Result<(), heapview_core::HeapError> {
                self.handle.clear()
            }
        }
    };
}

pub(crate) use heap_ref;

#[cfg(test)]
mod tests {
    use super::*;
    use heapview_core::ManagerConfig;
    use heapview_test_utils::{BumpHost, RecordingHost};

    #[test]
    fn free_is_idempotent() {
        let (host, log) = RecordingHost::new(BumpHost::new(64));
        let m = HeapManager::with_defaults(host).unwrap();
        let address = m.alloc(8).unwrap();
        let mut handle = Handle::owned(&m, address, 8, "raw");
        assert_eq!(handle.live(), Ok(address));
        handle.free();
        handle.free();
        assert_eq!(handle.live(), Err(HeapError::UseAfterFree { reference: "raw" }));
        assert_eq!(log.deallocations(), vec![address]);
    }

    #[test]
    fn only_owned_handles_reclaim_on_drop() {
        let (host, log) = RecordingHost::new(BumpHost::new(64));
        let config = ManagerConfig::new().with_reclaim_on_drop(true);
        let m = HeapManager::new(host, config).unwrap();
        let owned = m.alloc(8).unwrap();
        let wrapped = m.alloc(8).unwrap();
        drop(Handle::owned(&m, owned, 8, "raw"));
        drop(Handle::wrapped(&m, wrapped, 8, "raw").unwrap());
        assert_eq!(log.deallocations(), vec![owned]);
    }

    #[test]
    fn clear_zeroes_the_span() {
        let m = HeapManager::with_defaults(BumpHost::new(64)).unwrap();
        let address = m.alloc(16).unwrap();
        m.fill_bytes(address, 16, 0x5A).unwrap();
        let handle = Handle::wrapped(&m, address, 12, "raw").unwrap();
        handle.clear().unwrap();
        let bytes = m.copy_from_heap(address, 16).unwrap();
        assert_eq!(&bytes[..12], &[0; 12]);
        assert_eq!(&bytes[12..], &[0x5A; 4]);
    }

    #[test]
    fn wrapped_spans_must_fit_the_address_space() {
        let m = HeapManager::with_defaults(BumpHost::new(64)).unwrap();
        assert!(Handle::wrapped(&m, Address::NULL, 8, "raw").is_err());
        assert!(matches!(
            Handle::wrapped(&m, Address(16), usize::MAX - 8, "raw"),
            Err(HeapError::InvalidArgument { .. })
        ));
        assert!(Handle::wrapped(&m, Address(16), usize::MAX - 16, "raw").is_ok());
    }
}
