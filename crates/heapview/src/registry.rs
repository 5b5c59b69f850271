//! Registry of live gateway allocations.
//!
//! Every region the gateway obtains from the host is recorded here until it
//! is freed. Iteration follows allocation order (an [`IndexMap`] with
//! order-preserving removal), so bulk frees are deterministic.

use std::fmt;

use indexmap::IndexMap;

use heapview_core::Address;

/// Identifies one [`HeapScope`](crate::HeapScope) within a manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Bookkeeping for one live allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Start of the region.
    pub address: Address,
    /// Monotonic allocation counter value, unique per manager.
    pub serial: u64,
    /// Bytes requested from the host.
    pub byte_size: usize,
    /// The scope that owns the allocation, if any.
    pub scope: Option<ScopeId>,
}

/// Insertion-ordered map of live allocations keyed by address.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    live: IndexMap<Address, Allocation>,
    next_serial: u64,
    next_scope: u32,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a fresh allocation. A stale entry at the same address (the
    /// host reused memory freed behind the registry's back) is replaced.
    pub(crate) fn insert(&mut self, address: Address, byte_size: usize, scope: Option<ScopeId>) {
        let serial = self.next_serial;
        self.next_serial += 1;
        if self.live.shift_remove(&address).is_some() {
            tracing::warn!(%address, "host returned an address that is still registered");
        }
        self.live.insert(
            address,
            Allocation {
                address,
                serial,
                byte_size,
                scope,
            },
        );
    }

    pub(crate) fn remove(&mut self, address: Address) -> Option<Allocation> {
        self.live.shift_remove(&address)
    }

    pub(crate) fn new_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        id
    }

    /// Remove and return every allocation, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<Allocation> {
        self.live.drain(..).map(|(_, a)| a).collect()
    }

    /// Remove and return every allocation owned by `scope`, oldest first.
    pub(crate) fn drain_scope(&mut self, scope: ScopeId) -> Vec<Allocation> {
        let members: Vec<Allocation> = self
            .live
            .values()
            .filter(|a| a.scope == Some(scope))
            .copied()
            .collect();
        self.live.retain(|_, a| a.scope != Some(scope));
        members
    }

    pub(crate) fn snapshot(&self) -> Vec<Allocation> {
        self.live.values().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn live_bytes(&self) -> usize {
        self.live.values().map(|a| a.byte_size).sum()
    }
}
