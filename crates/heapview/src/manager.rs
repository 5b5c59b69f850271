//! The heap manager: host, view cache, registry, and address-scoped access.
//!
//! [`HeapManager`] owns the embedder's [`HeapHost`] and one [`ViewCache`].
//! Every access asks the cache for the generation to use (applying the
//! polling policy), so a manager always reads and writes the buffer the
//! policy says is current. References borrow the manager, which hands
//! them out through factories such as [`HeapManager::alloc_array`].
//!
//! A manager is single-agent (`!Sync`). Several agents may share one heap
//! by each building a manager over the same buffer.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use heapview_buffer::{Access, Generation, HeapBuffer, HeapHost, Scalar, ViewCache};
use heapview_codec::{read_terminated, write_terminated};
use heapview_core::{Address, AllocError, Encoding, HeapError, ManagerConfig};

use crate::registry::{Registry, ScopeId};
use crate::span;

/// Typed access to an embedder-owned heap.
pub struct HeapManager {
    host: RefCell<Box<dyn HeapHost>>,
    cache: RefCell<ViewCache>,
    pub(crate) registry: RefCell<Registry>,
    config: ManagerConfig,
}

impl HeapManager {
    /// Build a manager over `host`.
    ///
    /// Generation 0 is built from the host's current buffer. Fails with
    /// [`HeapError::InvalidConfig`] if the configuration cannot work with
    /// that buffer.
    pub fn new<H: HeapHost + 'static>(host: H, config: ManagerConfig) -> Result<Self, HeapError> {
        let buffer = host.current_buffer();
        config.validate(buffer.byte_len())?;
        tracing::debug!(
            polling_mode = %config.polling_mode,
            byte_len = buffer.byte_len(),
            "heap manager attached"
        );
        Ok(Self {
            cache: RefCell::new(ViewCache::with_buffer(config.polling_mode, buffer)),
            host: RefCell::new(Box::new(host)),
            registry: RefCell::new(Registry::new()),
            config,
        })
    }

    /// Build a manager with [`ManagerConfig::default`].
    pub fn with_defaults<H: HeapHost + 'static>(host: H) -> Result<Self, HeapError> {
        Self::new(host, ManagerConfig::default())
    }

    /// The configuration the manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The generation the next access will use, after applying the polling
    /// policy.
    pub fn generation(&self) -> Arc<Generation> {
        let host = self.host.borrow();
        self.cache.borrow_mut().generation(&*host)
    }

    /// Poll the host now regardless of policy. Returns whether the views
    /// were rebuilt.
    pub fn refresh(&self) -> bool {
        let host = self.host.borrow();
        self.cache.borrow_mut().refresh(&*host)
    }

    /// Number of the cached generation, without polling.
    pub fn generation_number(&self) -> u64 {
        self.cache.borrow().generation_number()
    }

    /// The buffer the next access will use.
    pub fn buffer(&self) -> HeapBuffer {
        self.generation().buffer().clone()
    }

    // ── Host calls ──────────────────────────────────────────────

    /// Obtain `byte_size` bytes from the host, aligned to `align`, zeroed
    /// if configured, and registered under `scope`.
    pub(crate) fn allocate_in(
        &self,
        byte_size: usize,
        align: usize,
        scope: Option<ScopeId>,
    ) -> Result<Address, HeapError> {
        if byte_size == 0 {
            return Err(HeapError::invalid("zero-sized allocation"));
        }
        let result = self.host.borrow_mut().allocate(byte_size);
        let address = match result {
            Ok(address) if !address.is_null() => address,
            Ok(_) => {
                return Err(AllocError::new(byte_size, "host returned the null address").into())
            }
            Err(e) => {
                tracing::warn!(byte_size, reason = %e.reason, "host allocation failed");
                return Err(e.into());
            }
        };
        tracing::trace!(%address, byte_size, "allocated");

        if !address.is_aligned_to(align) {
            self.host.borrow_mut().deallocate(address);
            return Err(HeapError::invalid(format!(
                "host returned {address}, which is not {align}-byte aligned"
            )));
        }
        if self.config.clear_allocated_regions {
            if let Err(e) = self.generation().buffer().fill(address, byte_size, 0) {
                self.host.borrow_mut().deallocate(address);
                return Err(e);
            }
        }
        self.registry.borrow_mut().insert(address, byte_size, scope);
        Ok(address)
    }

    /// Return `address` to the host and drop its registry entry.
    pub(crate) fn deallocate(&self, address: Address) {
        let registered = self.registry.borrow_mut().remove(address).is_some();
        tracing::trace!(%address, registered, "deallocating");
        self.host.borrow_mut().deallocate(address);
    }

    // ── Address-scoped access ───────────────────────────────────

    pub(crate) fn load<K: Scalar>(&self, address: Address, access: Access) -> Result<K, HeapError> {
        K::load_at(&self.generation(), address, access)
    }

    pub(crate) fn store<K: Scalar>(
        &self,
        address: Address,
        value: K,
        access: Access,
    ) -> Result<(), HeapError> {
        K::store_at(&self.generation(), address, value, access)
    }

    /// Plain read of the `K` at `address`.
    pub fn read<K: Scalar>(&self, address: Address) -> Result<K, HeapError> {
        check_scalar_address::<K>(address)?;
        self.load(address, Access::Plain)
    }

    /// Plain write of the `K` at `address`.
    pub fn write<K: Scalar>(&self, address: Address, value: K) -> Result<(), HeapError> {
        check_scalar_address::<K>(address)?;
        self.store(address, value, Access::Plain)
    }

    /// Sequentially consistent read of the `K` at `address`.
    pub fn read_atomic<K: Scalar>(&self, address: Address) -> Result<K, HeapError> {
        check_scalar_address::<K>(address)?;
        self.load(address, Access::Atomic)
    }

    /// Sequentially consistent write of the `K` at `address`.
    pub fn write_atomic<K: Scalar>(&self, address: Address, value: K) -> Result<(), HeapError> {
        check_scalar_address::<K>(address)?;
        self.store(address, value, Access::Atomic)
    }

    /// Set `len` bytes from `address` to `value`.
    pub fn fill_bytes(&self, address: Address, len: usize, value: u8) -> Result<(), HeapError> {
        self.generation().buffer().fill(address, len, value)
    }

    /// Copy `bytes` into the heap at `address`.
    pub fn copy_to_heap(&self, address: Address, bytes: &[u8]) -> Result<(), HeapError> {
        self.generation().buffer().write_bytes(address, bytes)
    }

    /// Copy `len` bytes out of the heap from `address`.
    pub fn copy_from_heap(&self, address: Address, len: usize) -> Result<Vec<u8>, HeapError> {
        self.generation().buffer().read_bytes(address, len)
    }

    /// Read the null-terminated string at `address`.
    ///
    /// With `max_units` the terminator must appear within that many units;
    /// without it the scan runs to the end of the heap.
    pub fn read_string(
        &self,
        address: Address,
        encoding: Encoding,
        max_units: Option<usize>,
    ) -> Result<String, HeapError> {
        let generation = self.generation();
        span::with_units(&generation, address, encoding, None, Access::Plain, |units| {
            read_terminated(encoding, &*units, max_units, address)
        })?
    }

    /// Write `text` and a terminator into the `capacity` units at
    /// `address`. Returns the units written before the terminator.
    pub fn write_string(
        &self,
        address: Address,
        encoding: Encoding,
        text: &str,
        capacity: usize,
    ) -> Result<usize, HeapError> {
        let generation = self.generation();
        span::with_units(
            &generation,
            address,
            encoding,
            Some(capacity),
            Access::Plain,
            |units| write_terminated(encoding, text, units),
        )?
    }

    /// Units before the terminator of the string at `address`.
    pub fn string_len(
        &self,
        address: Address,
        encoding: Encoding,
        max_units: Option<usize>,
    ) -> Result<usize, HeapError> {
        let generation = self.generation();
        span::with_units(&generation, address, encoding, None, Access::Plain, |units| {
            span::terminator(&*units, max_units, address)
        })?
    }
}

impl fmt::Debug for HeapManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapManager")
            .field("config", &self.config)
            .field("generation", &self.generation_number())
            .field("live_allocations", &self.registry.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Scalars must sit on their natural alignment (capped at 8 bytes, the
/// widest cell).
pub(crate) fn check_scalar_address<K: Scalar>(address: Address) -> Result<(), HeapError> {
    let align = K::WIDTH.min(8);
    if address.is_aligned_to(align) {
        Ok(())
    } else {
        Err(HeapError::invalid(format!(
            "{address} is not {align}-byte aligned for {}",
            K::NAME
        )))
    }
}
