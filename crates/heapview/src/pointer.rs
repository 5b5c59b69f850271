//! References to cells that hold heap addresses.
//!
//! The stored width and value range of a pointer are chosen by its
//! [`PointerFlavor`]:
//!
//! | Flavor | Cell | Range |
//! |--------|------|-------|
//! | [`Ptr32`] | `u32` | `0..=u32::MAX` |
//! | [`Ptr64`] | `u64` | `0..=usize::MAX` |
//! | [`PtrSafe53`] | `u64` | `0..=2^53 - 1` |

use std::fmt;
use std::marker::PhantomData;

use heapview_buffer::{Access, Element, Scalar};
use heapview_core::{Address, HeapError};

use crate::handle::{heap_ref, Handle};
use crate::number::NumberRef;

/// Largest address a [`PtrSafe53`] cell may hold: every integer up to it is
/// exactly representable as an `f64`.
pub const MAX_SAFE_ADDRESS: u64 = (1 << 53) - 1;

mod sealed {
    pub trait Sealed {}
}

/// How a pointer cell stores an address.
pub trait PointerFlavor: sealed::Sealed + 'static {
    /// The cell type.
    type Cell: Element;

    /// Short name for diagnostics.
    const NAME: &'static str;

    /// Convert an address to its cell value.
    fn encode(address: Address) -> Result<Self::Cell, HeapError>;

    /// Convert a cell value back to an address.
    fn decode(cell: Self::Cell) -> Result<Address, HeapError>;
}

/// A 32-bit pointer.
#[derive(Clone, Copy, Debug)]
pub struct Ptr32;

/// A 64-bit pointer.
#[derive(Clone, Copy, Debug)]
pub struct Ptr64;

/// A 64-bit pointer restricted to the 53-bit range exactly representable
/// as a double.
#[derive(Clone, Copy, Debug)]
pub struct PtrSafe53;

impl sealed::Sealed for Ptr32 {}
impl sealed::Sealed for Ptr64 {}
impl sealed::Sealed for PtrSafe53 {}

impl PointerFlavor for Ptr32 {
    type Cell = u32;
    const NAME: &'static str = "ptr32";

    fn encode(address: Address) -> Result<u32, HeapError> {
        u32::try_from(address.get())
            .map_err(|_| HeapError::invalid(format!("{address} does not fit a 32-bit pointer")))
    }

    fn decode(cell: u32) -> Result<Address, HeapError> {
        usize::try_from(cell)
            .map(Address)
            .map_err(|_| HeapError::invalid(format!("pointer value {cell} exceeds usize")))
    }
}

impl PointerFlavor for Ptr64 {
    type Cell = u64;
    const NAME: &'static str = "ptr64";

    fn encode(address: Address) -> Result<u64, HeapError> {
        Ok(address.get() as u64)
    }

    fn decode(cell: u64) -> Result<Address, HeapError> {
        usize::try_from(cell)
            .map(Address)
            .map_err(|_| HeapError::invalid(format!("pointer value {cell} exceeds usize")))
    }
}

impl PointerFlavor for PtrSafe53 {
    type Cell = u64;
    const NAME: &'static str = "ptr53";

    fn encode(address: Address) -> Result<u64, HeapError> {
        let value = address.get() as u64;
        if value > MAX_SAFE_ADDRESS {
            return Err(HeapError::invalid(format!(
                "{address} exceeds the 53-bit safe pointer range"
            )));
        }
        Ok(value)
    }

    fn decode(cell: u64) -> Result<Address, HeapError> {
        if cell > MAX_SAFE_ADDRESS {
            return Err(HeapError::invalid(format!(
                "pointer value {cell} exceeds the 53-bit safe range"
            )));
        }
        Ptr64::decode(cell)
    }
}

/// Options for [`PointerRef::free_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerFree {
    /// Also deallocate the address the pointer holds (if non-null), before
    /// the pointer cell itself.
    pub free_pointed_address: bool,
}

/// A reference to a cell holding an address.
pub struct PointerRef<'m, P: PointerFlavor> {
    pub(crate) handle: Handle<'m>,
    _flavor: PhantomData<P>,
}

heap_ref!(PointerRef<P: PointerFlavor>);

impl<'m, P: PointerFlavor> PointerRef<'m, P> {
    pub(crate) fn new(handle: Handle<'m>) -> Self {
        Self {
            handle,
            _flavor: PhantomData,
        }
    }

    /// Plain read of the stored address.
    pub fn read(&self) -> Result<Address, HeapError> {
        self.load(Access::Plain)
    }

    /// Plain write of the stored address.
    pub fn write(&self, target: Address) -> Result<(), HeapError> {
        self.store(target, Access::Plain)
    }

    /// Sequentially consistent read of the stored address.
    pub fn read_atomic(&self) -> Result<Address, HeapError> {
        self.load(Access::Atomic)
    }

    /// Sequentially consistent write of the stored address.
    pub fn write_atomic(&self, target: Address) -> Result<(), HeapError> {
        self.store(target, Access::Atomic)
    }

    /// A non-owning numeric reference to the address the pointer holds.
    pub fn target<K: Scalar>(&self) -> Result<NumberRef<'m, K>, HeapError> {
        let target = self.read()?;
        self.handle.manager().wrap_number(target)
    }

    /// Free the pointer, optionally freeing what it points to first.
    ///
    /// The pointee is read before anything is deallocated. No-op if the
    /// pointer is already freed.
    pub fn free_with(&mut self, options: PointerFree) -> Result<(), HeapError> {
        if self.handle.live().is_err() {
            return Ok(());
        }
        if options.free_pointed_address {
            let target = self.read()?;
            if !target.is_null() {
                self.handle.manager().deallocate(target);
            }
        }
        self.handle.free();
        Ok(())
    }

    fn load(&self, access: Access) -> Result<Address, HeapError> {
        let address = self.handle.live()?;
        let cell: P::Cell = self.handle.manager().load(address, access)?;
        P::decode(cell)
    }

    fn store(&self, target: Address, access: Access) -> Result<(), HeapError> {
        let address = self.handle.live()?;
        let cell = P::encode(target)?;
        self.handle.manager().store(address, cell, access)
    }
}

impl<P: PointerFlavor> fmt::Debug for PointerRef<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerRef")
            .field("flavor", &P::NAME)
            .field("address", &self.handle.address())
            .finish()
    }
}
