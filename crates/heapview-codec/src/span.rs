//! Unit spans over heap views.

use std::cell::Cell;

use heapview_buffer::{Access, Element, TypedView};
use heapview_core::{Address, HeapError};

use crate::units::{UnitSink, UnitSource};

/// `len` consecutive elements of a typed view, starting at element `start`.
///
/// Bounds are checked once at construction. If the buffer is detached
/// afterwards, reads yield zero units, writes are dropped, and the first
/// failure is held until [`UnitSource::status`] reports it.
pub struct ViewSpan<'v, K: Element> {
    view: &'v TypedView<K>,
    start: usize,
    len: usize,
    access: Access,
    fault: Cell<Option<HeapError>>,
}

impl<K: Element> std::fmt::Debug for ViewSpan<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSpan")
            .field("view", self.view)
            .field("start", &self.start)
            .field("len", &self.len)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

impl<'v, K: Element> ViewSpan<'v, K> {
    /// Span `len` elements from `start`.
    pub fn new(view: &'v TypedView<K>, start: usize, len: usize) -> Result<Self, HeapError> {
        match start.checked_add(len) {
            Some(end) if end <= view.len() => Ok(Self {
                view,
                start,
                len,
                access: Access::Plain,
                fault: Cell::new(None),
            }),
            _ => Err(HeapError::OutOfBounds {
                address: Address(start.saturating_mul(K::WIDTH)),
                len: len.saturating_mul(K::WIDTH),
                buffer_len: view.buffer().byte_len(),
            }),
        }
    }

    /// Span from `start` to the end of the view.
    pub fn to_end(view: &'v TypedView<K>, start: usize) -> Result<Self, HeapError> {
        Self::new(view, start, view.len().saturating_sub(start))
    }

    /// Use `access` for every unit load and store.
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// First element index.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte address of the first element.
    pub fn address(&self) -> Address {
        Address(self.start * K::WIDTH)
    }

    fn record(&self, err: HeapError) {
        let first = self.fault.take().unwrap_or(err);
        self.fault.set(Some(first));
    }
}

macro_rules! span_units {
    ($($int:ty),*) => {
        $(
            impl UnitSource for ViewSpan<'_, $int> {
                fn unit_count(&self) -> usize {
                    self.len
                }

                fn unit(&self, index: usize) -> u32 {
                    match self.view.load(self.start + index, self.access) {
                        Ok(unit) => u32::from(unit),
                        Err(err) => {
                            self.record(err);
                            0
                        }
                    }
                }

                fn status(&self) -> Result<(), HeapError> {
                    match self.fault.take() {
                        Some(err) => {
                            self.fault.set(Some(err.clone()));
                            Err(err)
                        }
                        None => Ok(()),
                    }
                }
            }

            impl UnitSink for ViewSpan<'_, $int> {
                fn set_unit(&mut self, index: usize, unit: u32) {
                    if let Err(err) = self.view.store(self.start + index, unit as $int, self.access) {
                        self.record(err);
                    }
                }
            }
        )*
    };
}

span_units!(u8, u16, u32);

#[cfg(test)]
mod tests {
    use super::*;
    use heapview_buffer::HeapBuffer;

    #[test]
    fn span_reads_and_writes_through_the_view() {
        let buf = HeapBuffer::new(16).unwrap();
        let view = TypedView::<u16>::new(&buf);
        let mut span = ViewSpan::new(&view, 2, 3).unwrap();
        span.set_unit(0, 0x41);
        span.set_unit(2, 0xFFFF);
        assert_eq!(view.read(2).unwrap(), 0x41);
        assert_eq!(view.read(4).unwrap(), 0xFFFF);
        assert_eq!(span.unit(2), 0xFFFF);
        assert_eq!(span.address(), Address(4));
    }

    #[test]
    fn atomic_spans_round_trip() {
        let buf = HeapBuffer::new(8).unwrap();
        let view = TypedView::<u32>::new(&buf);
        let mut span = ViewSpan::new(&view, 0, 2).unwrap().with_access(Access::Atomic);
        span.set_unit(1, 0x1F600);
        assert_eq!(span.unit(1), 0x1F600);
        assert_eq!(view.read_atomic(1).unwrap(), 0x1F600);
    }

    #[test]
    fn construction_is_bounds_checked() {
        let buf = HeapBuffer::new(8).unwrap();
        let view = TypedView::<u32>::new(&buf);
        assert!(ViewSpan::new(&view, 1, 1).is_ok());
        assert!(matches!(
            ViewSpan::new(&view, 1, 2),
            Err(HeapError::OutOfBounds { .. })
        ));
        assert!(ViewSpan::new(&view, usize::MAX, 2).is_err());
    }

    #[test]
    fn detached_buffer_faults_the_span() {
        let buf = HeapBuffer::new(16).unwrap();
        let view = TypedView::<u8>::new(&buf);
        let mut span = ViewSpan::new(&view, 8, 8).unwrap();
        span.set_unit(0, 1);
        assert!(span.status().is_ok());

        buf.detach();
        span.set_unit(1, 2);
        assert!(matches!(span.status(), Err(HeapError::OutOfBounds { .. })));
        // The fault is sticky.
        assert_eq!(span.unit(0), 0);
        assert!(span.status().is_err());
    }

    #[test]
    fn to_end_covers_the_tail() {
        let buf = HeapBuffer::new(16).unwrap();
        let view = TypedView::<u8>::new(&buf);
        assert_eq!(ViewSpan::to_end(&view, 10).unwrap().len(), 6);
        assert!(ViewSpan::to_end(&view, 16).unwrap().is_empty());
        assert!(ViewSpan::to_end(&view, 17).is_err());
    }
}
