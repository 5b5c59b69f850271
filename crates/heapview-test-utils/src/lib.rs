//! Test hosts and fixtures for heapview development.
//!
//! Illustrative embedders implementing [`HeapHost`]:
//!
//! - [`BumpHost`]: bump allocator that grows its buffer on demand and
//!   detaches the old instance, like a growing wasm memory.
//! - [`FixedHost`]: bump allocator over a buffer that never grows, so it
//!   can run out.
//! - [`RecordingHost`]: wraps another host and logs every call.
//! - [`SharedHeap`]: one buffer shared by several threads, each with its
//!   own [`SharedHost`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use heapview_buffer::{BufferSource, HeapBuffer, HeapHost};
use heapview_core::{Address, AllocError, DEFAULT_ALIGNMENT};

fn aligned_size(byte_size: usize) -> Option<usize> {
    byte_size.checked_next_multiple_of(DEFAULT_ALIGNMENT)
}

/// Bump allocator that grows (and replaces) its buffer on demand.
///
/// The first allocation starts at [`DEFAULT_ALIGNMENT`], never at 0.
/// Deallocation only records the address; memory is never reused.
pub struct BumpHost {
    buffer: HeapBuffer,
    next: usize,
    detach_on_growth: bool,
    freed: Vec<Address>,
}

impl BumpHost {
    /// A host whose buffer starts at `initial_len` bytes (rounded up to 8).
    pub fn new(initial_len: usize) -> Self {
        let len = aligned_size(initial_len).unwrap_or(initial_len);
        Self {
            buffer: HeapBuffer::new(len).unwrap_or_else(|_| HeapBuffer::empty()),
            next: DEFAULT_ALIGNMENT,
            detach_on_growth: true,
            freed: Vec::new(),
        }
    }

    /// Keep old buffers attached after growth, so only identity changes.
    pub fn keep_old_buffers(mut self) -> Self {
        self.detach_on_growth = false;
        self
    }

    /// Addresses passed to `deallocate`, in call order.
    pub fn freed(&self) -> &[Address] {
        &self.freed
    }

    /// Bytes handed out so far, including the reserved null page.
    pub fn used(&self) -> usize {
        self.next
    }
}

impl BufferSource for BumpHost {
    fn current_buffer(&self) -> HeapBuffer {
        self.buffer.clone()
    }
}

impl HeapHost for BumpHost {
    fn allocate(&mut self, byte_size: usize) -> Result<Address, AllocError> {
        let size = aligned_size(byte_size).ok_or_else(|| AllocError::new(byte_size, "size overflow"))?;
        let end = self
            .next
            .checked_add(size)
            .ok_or_else(|| AllocError::new(byte_size, "address space exhausted"))?;
        if end > self.buffer.byte_len() {
            let new_len = end.max(self.buffer.byte_len() * 2);
            let grown = self
                .buffer
                .grown(new_len)
                .map_err(|e| AllocError::new(byte_size, e.to_string()))?;
            if self.detach_on_growth && !self.buffer.is_empty() {
                self.buffer.detach();
            }
            self.buffer = grown;
        }
        let address = Address(self.next);
        self.next = end;
        Ok(address)
    }

    fn deallocate(&mut self, address: Address) {
        self.freed.push(address);
    }
}

/// Bump allocator over a buffer that never grows.
pub struct FixedHost {
    buffer: HeapBuffer,
    next: usize,
}

impl FixedHost {
    /// A host with exactly `capacity` bytes (rounded up to 8).
    pub fn new(capacity: usize) -> Self {
        let len = aligned_size(capacity).unwrap_or(capacity);
        Self {
            buffer: HeapBuffer::new(len).unwrap_or_else(|_| HeapBuffer::empty()),
            next: DEFAULT_ALIGNMENT,
        }
    }
}

impl BufferSource for FixedHost {
    fn current_buffer(&self) -> HeapBuffer {
        self.buffer.clone()
    }
}

impl HeapHost for FixedHost {
    fn allocate(&mut self, byte_size: usize) -> Result<Address, AllocError> {
        let end = aligned_size(byte_size)
            .and_then(|size| self.next.checked_add(size))
            .filter(|&end| end <= self.buffer.byte_len())
            .ok_or_else(|| {
                AllocError::new(
                    byte_size,
                    format!("heap cannot grow past {} bytes", self.buffer.byte_len()),
                )
            })?;
        let address = Address(self.next);
        self.next = end;
        Ok(address)
    }

    fn deallocate(&mut self, _address: Address) {}
}

/// One host call, as seen by a [`RecordingHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    /// `allocate(size)` returned `result`.
    Allocate {
        size: usize,
        result: Result<Address, AllocError>,
    },
    /// `deallocate(address)`.
    Deallocate(Address),
}

/// Shared, clonable log of host calls.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<HostCall>>>);

impl CallLog {
    /// Every call so far.
    pub fn calls(&self) -> Vec<HostCall> {
        self.0.borrow().clone()
    }

    /// Addresses passed to `deallocate`, in call order.
    pub fn deallocations(&self) -> Vec<Address> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                HostCall::Deallocate(address) => Some(*address),
                HostCall::Allocate { .. } => None,
            })
            .collect()
    }

    /// Number of successful allocations.
    pub fn allocation_count(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|call| matches!(call, HostCall::Allocate { result: Ok(_), .. }))
            .count()
    }

    fn push(&self, call: HostCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Wraps a host and records every allocate/deallocate call.
pub struct RecordingHost<H> {
    inner: H,
    log: CallLog,
}

impl<H: HeapHost> RecordingHost<H> {
    /// Wrap `inner`. Keep the returned log to inspect calls after the host
    /// has been moved into a manager.
    pub fn new(inner: H) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

impl<H: HeapHost> BufferSource for RecordingHost<H> {
    fn current_buffer(&self) -> HeapBuffer {
        self.inner.current_buffer()
    }
}

impl<H: HeapHost> HeapHost for RecordingHost<H> {
    fn allocate(&mut self, byte_size: usize) -> Result<Address, AllocError> {
        let result = self.inner.allocate(byte_size);
        self.log.push(HostCall::Allocate {
            size: byte_size,
            result: result.clone(),
        });
        result
    }

    fn deallocate(&mut self, address: Address) {
        self.log.push(HostCall::Deallocate(address));
        self.inner.deallocate(address);
    }
}

/// A heap shared by several threads. Hand each thread its own
/// [`SharedHost`] via [`SharedHeap::host`].
#[derive(Clone)]
pub struct SharedHeap {
    buffer: Arc<Mutex<HeapBuffer>>,
    next: Arc<AtomicUsize>,
}

impl SharedHeap {
    /// A shared heap of `capacity` bytes (rounded up to 8).
    pub fn new(capacity: usize) -> Self {
        let len = aligned_size(capacity).unwrap_or(capacity);
        Self {
            buffer: Arc::new(Mutex::new(
                HeapBuffer::new(len).unwrap_or_else(|_| HeapBuffer::empty()),
            )),
            next: Arc::new(AtomicUsize::new(DEFAULT_ALIGNMENT)),
        }
    }

    /// A host over this heap, for one agent.
    pub fn host(&self) -> SharedHost {
        SharedHost { heap: self.clone() }
    }

    /// The current buffer.
    pub fn buffer(&self) -> HeapBuffer {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new buffer instance for every agent.
    pub fn replace(&self, buffer: HeapBuffer) {
        *self.buffer.lock().unwrap_or_else(PoisonError::into_inner) = buffer;
    }
}

/// One agent's view of a [`SharedHeap`].
pub struct SharedHost {
    heap: SharedHeap,
}

impl BufferSource for SharedHost {
    fn current_buffer(&self) -> HeapBuffer {
        self.heap.buffer()
    }
}

impl HeapHost for SharedHost {
    fn allocate(&mut self, byte_size: usize) -> Result<Address, AllocError> {
        let size = aligned_size(byte_size).ok_or_else(|| AllocError::new(byte_size, "size overflow"))?;
        let capacity = self.heap.buffer().byte_len();
        let start = self.heap.next.fetch_add(size, Ordering::Relaxed);
        if start.checked_add(size).is_none_or(|end| end > capacity) {
            return Err(AllocError::new(byte_size, "shared heap exhausted"));
        }
        Ok(Address(start))
    }

    fn deallocate(&mut self, _address: Address) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_host_starts_past_null_and_grows() {
        let mut host = BumpHost::new(16);
        let first = host.buffer.clone();
        assert_eq!(host.allocate(4).unwrap(), Address(8));
        assert_eq!(host.allocate(20).unwrap(), Address(16));
        assert!(host.current_buffer().byte_len() >= 40);
        assert!(first.is_detached());
    }

    #[test]
    fn bump_host_tracks_usage_and_frees() {
        let mut host = BumpHost::new(64);
        assert_eq!(host.used(), 8);
        let a = host.allocate(3).unwrap();
        let b = host.allocate(8).unwrap();
        assert_eq!(host.used(), 24);
        host.deallocate(b);
        host.deallocate(a);
        assert_eq!(host.freed(), &[b, a]);
        // Freed memory is not reused.
        assert_eq!(host.allocate(8).unwrap(), Address(24));
    }

    #[test]
    fn fixed_host_runs_out() {
        let mut host = FixedHost::new(32);
        assert!(host.allocate(16).is_ok());
        let err = host.allocate(16).unwrap_err();
        assert_eq!(err.requested, 16);
    }

    #[test]
    fn recording_host_logs_calls() {
        let (mut host, log) = RecordingHost::new(BumpHost::new(64));
        let a = host.allocate(8).unwrap();
        host.deallocate(a);
        assert_eq!(log.allocation_count(), 1);
        assert_eq!(log.deallocations(), vec![a]);
    }

    #[test]
    fn shared_hosts_never_overlap() {
        let heap = SharedHeap::new(64);
        let mut a = heap.host();
        let mut b = heap.host();
        let x = a.allocate(8).unwrap();
        let y = b.allocate(8).unwrap();
        assert_ne!(x, y);
        assert!(a.current_buffer().same_buffer(&b.current_buffer()));
    }
}
