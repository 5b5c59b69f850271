//! References to a single numeric cell.

use std::fmt;
use std::marker::PhantomData;

use heapview_buffer::{Access, Scalar, U8Clamped};
use heapview_core::HeapError;

use crate::handle::{heap_ref, Handle};

/// A reference to one `K` in the heap.
///
/// Holds no cached value: every read goes to the heap through the current
/// generation.
pub struct NumberRef<'m, K: Scalar> {
    pub(crate) handle: Handle<'m>,
    _kind: PhantomData<K>,
}

heap_ref!(NumberRef<K: Scalar>);

impl<'m, K: Scalar> NumberRef<'m, K> {
    pub(crate) fn new(handle: Handle<'m>) -> Self {
        Self {
            handle,
            _kind: PhantomData,
        }
    }

    /// Plain read.
    pub fn read(&self) -> Result<K, HeapError> {
        self.load(Access::Plain)
    }

    /// Plain write.
    pub fn write(&self, value: K) -> Result<(), HeapError> {
        self.store(value, Access::Plain)
    }

    /// Sequentially consistent read.
    pub fn read_atomic(&self) -> Result<K, HeapError> {
        self.load(Access::Atomic)
    }

    /// Sequentially consistent write.
    pub fn write_atomic(&self, value: K) -> Result<(), HeapError> {
        self.store(value, Access::Atomic)
    }

    fn load(&self, access: Access) -> Result<K, HeapError> {
        let address = self.handle.live()?;
        self.handle.manager().load(address, access)
    }

    fn store(&self, value: K, access: Access) -> Result<(), HeapError> {
        let address = self.handle.live()?;
        self.handle.manager().store(address, value, access)
    }
}

impl NumberRef<'_, U8Clamped> {
    /// Saturate `value` into `[0, 255]` (NaN → 0, half to even) and store
    /// it with one byte store.
    pub fn write_clamped(&self, value: f64) -> Result<(), HeapError> {
        self.store(U8Clamped::saturating_from_f64(value), Access::Plain)
    }

    /// As [`write_clamped`](Self::write_clamped), sequentially consistent.
    pub fn write_clamped_atomic(&self, value: f64) -> Result<(), HeapError> {
        self.store(U8Clamped::saturating_from_f64(value), Access::Atomic)
    }
}

impl<K: Scalar> fmt::Debug for NumberRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberRef")
            .field("kind", &K::NAME)
            .field("address", &self.handle.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HeapRef;
    use crate::manager::HeapManager;
    use heapview_test_utils::BumpHost;
    use proptest::prelude::*;

    fn manager() -> HeapManager {
        HeapManager::with_defaults(BumpHost::new(128)).unwrap()
    }

    /// Write `plain` with a plain store and `atomic` with an atomic one,
    /// reading each back through the matching path.
    fn round_trip<K: Scalar>(plain: K, atomic: K) -> (K, K) {
        let m = manager();
        let n = m.alloc_number(K::ZERO).unwrap();
        n.write(plain).unwrap();
        let first = n.read().unwrap();
        n.write_atomic(atomic).unwrap();
        (first, n.read_atomic().unwrap())
    }

    #[test]
    fn freed_numbers_reject_access() {
        let m = manager();
        let mut n = m.alloc_number(5i64).unwrap();
        assert_eq!(n.allocated_byte_count(), 8);
        n.free();
        assert!(n.is_freed());
        assert_eq!(
            n.read().unwrap_err(),
            HeapError::UseAfterFree { reference: "number" }
        );
        assert!(n.write_atomic(1).is_err());
    }

    #[test]
    fn clamped_writes_saturate() {
        let m = manager();
        let n = m.alloc_number(U8Clamped(0)).unwrap();
        n.write_clamped(300.0).unwrap();
        assert_eq!(n.read().unwrap(), U8Clamped(255));
        n.write_clamped_atomic(-1.0).unwrap();
        assert_eq!(n.read_atomic().unwrap(), U8Clamped(0));
        n.write_clamped(2.5).unwrap();
        assert_eq!(n.read().unwrap(), U8Clamped(2));
        n.write_clamped(f64::NAN).unwrap();
        assert_eq!(n.read().unwrap(), U8Clamped(0));
    }

    #[test]
    fn debug_names_the_kind() {
        let m = manager();
        let n = m.alloc_number(1u16).unwrap();
        let shown = format!("{n:?}");
        assert!(shown.contains("u16"), "{shown}");
    }

    proptest! {
        #[test]
        fn i8_round_trips(a in any::<i8>(), b in any::<i8>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn u8_round_trips(a in any::<u8>(), b in any::<u8>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn clamped_u8_round_trips(a in any::<u8>(), b in any::<u8>()) {
            let (a, b) = (U8Clamped(a), U8Clamped(b));
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn i16_round_trips(a in any::<i16>(), b in any::<i16>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn u16_round_trips(a in any::<u16>(), b in any::<u16>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn u32_round_trips(a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn i64_round_trips(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn u64_round_trips(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        #[test]
        fn u128_round_trips(a in any::<u128>(), b in any::<u128>()) {
            prop_assert_eq!(round_trip(a, b), (a, b));
        }

        // NaN payloads must survive too, so compare bits.
        #[test]
        fn f32_round_trips(a in any::<u32>(), b in any::<u32>()) {
            let (x, y) = round_trip(f32::from_bits(a), f32::from_bits(b));
            prop_assert_eq!((x.to_bits(), y.to_bits()), (a, b));
        }
    }
}
