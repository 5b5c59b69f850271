//! The allocation gateway and reference factories.
//!
//! `alloc_*` factories obtain memory from the host (zero-filled when
//! [`ManagerConfig::clear_allocated_regions`](heapview_core::ManagerConfig)
//! is set), register it, and return an owning reference. `wrap_*`
//! factories bind a reference to memory the caller already owns; wrapped
//! references are never registered and never reclaimed on drop, but
//! `free()` still returns their region to the host.
//!
//! If initialising a fresh reference fails, its region is freed before the
//! error is returned.

use heapview_buffer::{Element, Scalar};
use heapview_core::{Address, Encoding, HeapError};

use crate::array::ArrayRef;
use crate::handle::{Handle, HeapRef};
use crate::manager::{check_scalar_address, HeapManager};
use crate::number::NumberRef;
use crate::pointer::{PointerFlavor, PointerRef};
use crate::registry::{Allocation, ScopeId};
use crate::scope::HeapScope;
use crate::string::StringRef;

impl HeapManager {
    // ── Raw allocation ──────────────────────────────────────────

    /// Allocate `byte_size` bytes and return the start address.
    pub fn alloc(&self, byte_size: usize) -> Result<Address, HeapError> {
        self.allocate_in(byte_size, 1, None)
    }

    /// Return `address` to the host. No reference is updated; a registry
    /// entry for the address, if any, is dropped. Freeing
    /// [`Address::NULL`] is a no-op.
    pub fn free(&self, address: Address) {
        if !address.is_null() {
            self.deallocate(address);
        }
    }

    /// Free any reference through its [`HeapRef`] capability.
    pub fn free_ref(&self, reference: &mut dyn HeapRef) {
        reference.free();
    }

    /// Open a scope whose allocations are freed when it closes.
    pub fn scope(&self) -> HeapScope<'_> {
        let id = self.registry.borrow_mut().new_scope();
        HeapScope::new(self, id)
    }

    // ── Registry ────────────────────────────────────────────────

    /// Every live gateway allocation, oldest first.
    pub fn live_allocations(&self) -> Vec<Allocation> {
        self.registry.borrow().snapshot()
    }

    /// Number of live gateway allocations.
    pub fn live_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Total bytes of live gateway allocations.
    pub fn live_bytes(&self) -> usize {
        self.registry.borrow().live_bytes()
    }

    /// Free every live gateway allocation, oldest first, and return how
    /// many were freed.
    ///
    /// Takes `&mut self`, so no reference or scope can still be borrowing
    /// the manager.
    pub fn free_all(&mut self) -> usize {
        let allocations = self.registry.get_mut().drain();
        for allocation in &allocations {
            self.deallocate(allocation.address);
        }
        tracing::debug!(count = allocations.len(), "freed all allocations");
        allocations.len()
    }

    // ── Numbers ─────────────────────────────────────────────────

    /// Allocate a `K` holding `value`.
    pub fn alloc_number<K: Scalar>(&self, value: K) -> Result<NumberRef<'_, K>, HeapError> {
        self.alloc_number_in(None, value)
    }

    /// Reference the `K` at `address`.
    pub fn wrap_number<K: Scalar>(&self, address: Address) -> Result<NumberRef<'_, K>, HeapError> {
        check_scalar_address::<K>(address)?;
        Ok(NumberRef::new(Handle::wrapped(self, address, K::WIDTH, "number")?))
    }

    pub(crate) fn alloc_number_in<K: Scalar>(
        &self,
        scope: Option<ScopeId>,
        value: K,
    ) -> Result<NumberRef<'_, K>, HeapError> {
        let address = self.allocate_in(K::WIDTH, K::WIDTH.min(8), scope)?;
        let number = NumberRef::new(Handle::owned(self, address, K::WIDTH, "number"));
        initialise(number, |n| n.write(value))
    }

    // ── Pointers ────────────────────────────────────────────────

    /// Allocate a pointer cell holding `target`.
    pub fn alloc_pointer<P: PointerFlavor>(
        &self,
        target: Address,
    ) -> Result<PointerRef<'_, P>, HeapError> {
        self.alloc_pointer_in(None, target)
    }

    /// Reference the pointer cell at `address`.
    pub fn wrap_pointer<P: PointerFlavor>(
        &self,
        address: Address,
    ) -> Result<PointerRef<'_, P>, HeapError> {
        check_scalar_address::<P::Cell>(address)?;
        let width = <P::Cell as Element>::WIDTH;
        Ok(PointerRef::new(Handle::wrapped(self, address, width, "pointer")?))
    }

    pub(crate) fn alloc_pointer_in<P: PointerFlavor>(
        &self,
        scope: Option<ScopeId>,
        target: Address,
    ) -> Result<PointerRef<'_, P>, HeapError> {
        // Reject unencodable targets before touching the host.
        P::encode(target)?;
        let width = <P::Cell as Element>::WIDTH;
        let address = self.allocate_in(width, width, scope)?;
        let pointer = PointerRef::new(Handle::owned(self, address, width, "pointer"));
        initialise(pointer, |p| p.write(target))
    }

    // ── Arrays ──────────────────────────────────────────────────

    /// Allocate an array of `len` elements (zeroed if configured).
    pub fn alloc_array<K: Element>(&self, len: usize) -> Result<ArrayRef<'_, K>, HeapError> {
        self.alloc_array_in(None, len)
    }

    /// Allocate an array holding a copy of `values`.
    pub fn alloc_array_from<K: Element>(&self, values: &[K]) -> Result<ArrayRef<'_, K>, HeapError> {
        self.alloc_array_from_in(None, values)
    }

    /// Reference the `len` elements at `address`.
    pub fn wrap_array<K: Element>(
        &self,
        address: Address,
        len: usize,
    ) -> Result<ArrayRef<'_, K>, HeapError> {
        check_alignment(address, K::WIDTH)?;
        let byte_size = array_bytes::<K>(len)?;
        Ok(ArrayRef::new(Handle::wrapped(self, address, byte_size, "array")?, len))
    }

    pub(crate) fn alloc_array_in<K: Element>(
        &self,
        scope: Option<ScopeId>,
        len: usize,
    ) -> Result<ArrayRef<'_, K>, HeapError> {
        let byte_size = array_bytes::<K>(len)?;
        let address = self.allocate_in(byte_size, K::WIDTH, scope)?;
        Ok(ArrayRef::new(Handle::owned(self, address, byte_size, "array"), len))
    }

    pub(crate) fn alloc_array_from_in<K: Element>(
        &self,
        scope: Option<ScopeId>,
        values: &[K],
    ) -> Result<ArrayRef<'_, K>, HeapError> {
        let array = self.alloc_array_in(scope, values.len())?;
        initialise(array, |a| a.copy_from_slice(values))
    }

    // ── Strings ─────────────────────────────────────────────────

    /// Allocate a string holding exactly `text` plus its terminator.
    pub fn alloc_string(&self, encoding: Encoding, text: &str) -> Result<StringRef<'_>, HeapError> {
        self.alloc_string_in(None, encoding, text)
    }

    /// Allocate an empty string with room for `capacity` units, terminator
    /// included.
    pub fn alloc_string_buffer(
        &self,
        encoding: Encoding,
        capacity: usize,
    ) -> Result<StringRef<'_>, HeapError> {
        self.alloc_string_buffer_in(None, encoding, capacity)
    }

    /// Reference the string of `capacity` units at `address`.
    pub fn wrap_string(
        &self,
        address: Address,
        encoding: Encoding,
        capacity: usize,
    ) -> Result<StringRef<'_>, HeapError> {
        let byte_size = string_bytes(encoding, capacity)?;
        check_alignment(address, encoding.unit_width())?;
        Ok(StringRef::new(
            Handle::wrapped(self, address, byte_size, "string")?,
            encoding,
            capacity,
        ))
    }

    pub(crate) fn alloc_string_in(
        &self,
        scope: Option<ScopeId>,
        encoding: Encoding,
        text: &str,
    ) -> Result<StringRef<'_>, HeapError> {
        let capacity = StringRef::capacity_for(encoding, text);
        let string = self.alloc_string_buffer_in(scope, encoding, capacity)?;
        initialise(string, |s| s.write(text))
    }

    pub(crate) fn alloc_string_buffer_in(
        &self,
        scope: Option<ScopeId>,
        encoding: Encoding,
        capacity: usize,
    ) -> Result<StringRef<'_>, HeapError> {
        let byte_size = string_bytes(encoding, capacity)?;
        let address = self.allocate_in(byte_size, encoding.unit_width(), scope)?;
        let string = StringRef::new(
            Handle::owned(self, address, byte_size, "string"),
            encoding,
            capacity,
        );
        if self.config().clear_allocated_regions {
            Ok(string)
        } else {
            initialise(string, |s| s.write(""))
        }
    }
}

/// Run `init` on a fresh reference; free it if `init` fails.
fn initialise<R: HeapRef>(
    mut reference: R,
    init: impl FnOnce(&R) -> Result<(), HeapError>,
) -> Result<R, HeapError> {
    if let Err(e) = init(&reference) {
        reference.free();
        return Err(e);
    }
    Ok(reference)
}

fn check_alignment(address: Address, align: usize) -> Result<(), HeapError> {
    if address.is_aligned_to(align) {
        Ok(())
    } else {
        Err(HeapError::invalid(format!("{address} is not {align}-byte aligned")))
    }
}

fn array_bytes<K: Element>(len: usize) -> Result<usize, HeapError> {
    len.checked_mul(K::WIDTH).ok_or_else(|| {
        HeapError::invalid(format!("array of {len} {} overflows the address space", K::KIND))
    })
}

fn string_bytes(encoding: Encoding, capacity: usize) -> Result<usize, HeapError> {
    if capacity == 0 {
        return Err(HeapError::invalid("string capacity must include the terminator"));
    }
    capacity.checked_mul(encoding.unit_width()).ok_or_else(|| {
        HeapError::invalid(format!(
            "{} string of {capacity} units overflows the address space",
            encoding.label()
        ))
    })
}
