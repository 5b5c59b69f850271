//! Scalars addressable by byte address, including 128/256-bit extensions.
//!
//! [`Scalar`] is what numeric references are generic over. Every
//! [`Element`] is a scalar backed by one cell; `u128` and [`U256`] are
//! composed of 2 and 4 little-endian `u64` limbs. Wide scalars are untorn
//! per limb only: an atomic access performs one atomic operation per limb,
//! in ascending limb order, with no whole-value atomicity.

use std::fmt;

use heapview_core::{Address, HeapError};

use crate::atomic::Access;
use crate::element::Element;
use crate::generation::Generation;

/// A value that can be loaded from and stored to a heap address.
pub trait Scalar: Copy + PartialEq + fmt::Debug + 'static {
    /// Width in bytes.
    const WIDTH: usize;

    /// Short name for diagnostics.
    const NAME: &'static str;

    /// The all-zero-bits value.
    const ZERO: Self;

    /// Load the value at `address` from `generation`.
    fn load_at(generation: &Generation, address: Address, access: Access) -> Result<Self, HeapError>;

    /// Store `value` at `address` in `generation`.
    fn store_at(
        generation: &Generation,
        address: Address,
        value: Self,
        access: Access,
    ) -> Result<(), HeapError>;
}

impl<E: Element> Scalar for E {
    const WIDTH: usize = <E as Element>::WIDTH;
    const NAME: &'static str = E::KIND.name();
    const ZERO: Self = <E as Element>::ZERO;

    #[inline]
    fn load_at(generation: &Generation, address: Address, access: Access) -> Result<Self, HeapError> {
        let view = generation.view::<E>();
        view.load(view_index::<E>(address), access)
    }

    #[inline]
    fn store_at(
        generation: &Generation,
        address: Address,
        value: Self,
        access: Access,
    ) -> Result<(), HeapError> {
        let view = generation.view::<E>();
        view.store(view_index::<E>(address), value, access)
    }
}

fn view_index<E: Element>(address: Address) -> usize {
    address.get() / <E as Element>::WIDTH
}

fn load_limbs<const N: usize>(
    generation: &Generation,
    address: Address,
    access: Access,
) -> Result<[u64; N], HeapError> {
    let view = generation.view::<u64>();
    let base = address.get() / 8;
    let mut limbs = [0u64; N];
    for (i, limb) in limbs.iter_mut().enumerate() {
        *limb = view.load(base + i, access).map_err(|_| wide_out_of_bounds::<N>(generation, address))?;
    }
    Ok(limbs)
}

fn store_limbs<const N: usize>(
    generation: &Generation,
    address: Address,
    limbs: [u64; N],
    access: Access,
) -> Result<(), HeapError> {
    let view = generation.view::<u64>();
    let base = address.get() / 8;
    if base.checked_add(N).is_none_or(|end| end > view.len()) {
        return Err(wide_out_of_bounds::<N>(generation, address));
    }
    for (i, limb) in limbs.into_iter().enumerate() {
        view.store(base + i, limb, access)?;
    }
    Ok(())
}

fn wide_out_of_bounds<const N: usize>(generation: &Generation, address: Address) -> HeapError {
    HeapError::OutOfBounds {
        address,
        len: N * 8,
        buffer_len: generation.byte_len(),
    }
}

impl Scalar for u128 {
    const WIDTH: usize = 16;
    const NAME: &'static str = "u128";
    const ZERO: Self = 0;

    fn load_at(generation: &Generation, address: Address, access: Access) -> Result<Self, HeapError> {
        let [lo, hi] = load_limbs::<2>(generation, address, access)?;
        Ok(lo as u128 | (hi as u128) << 64)
    }

    fn store_at(
        generation: &Generation,
        address: Address,
        value: Self,
        access: Access,
    ) -> Result<(), HeapError> {
        store_limbs(generation, address, [value as u64, (value >> 64) as u64], access)
    }
}

/// An unsigned 256-bit integer stored as four little-endian `u64` limbs.
///
/// Only storage and conversion are provided; arithmetic is out of scope.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct U256 {
    /// Limbs, least significant first.
    pub limbs: [u64; 4],
}

impl U256 {
    /// Zero.
    pub const ZERO: U256 = U256 { limbs: [0; 4] };

    /// The largest value.
    pub const MAX: U256 = U256 {
        limbs: [u64::MAX; 4],
    };

    /// Build from limbs, least significant first.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self { limbs }
    }

    /// Little-endian byte representation.
    pub fn to_le_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.limbs) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    /// Parse a little-endian byte representation.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(word);
        }
        Self { limbs }
    }

    /// The low 128 bits, if the high 128 bits are zero.
    pub fn to_u128(self) -> Option<u128> {
        if self.limbs[2] == 0 && self.limbs[3] == 0 {
            Some(self.limbs[0] as u128 | (self.limbs[1] as u128) << 64)
        } else {
            None
        }
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self::from_limbs([v as u64, (v >> 64) as u64, 0, 0])
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from_limbs([v, 0, 0, 0])
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({self})")
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x}{:016x}{:016x}{:016x}",
            self.limbs[3], self.limbs[2], self.limbs[1], self.limbs[0]
        )
    }
}

impl Scalar for U256 {
    const WIDTH: usize = 32;
    const NAME: &'static str = "u256";
    const ZERO: Self = U256::ZERO;

    fn load_at(generation: &Generation, address: Address, access: Access) -> Result<Self, HeapError> {
        load_limbs::<4>(generation, address, access).map(U256::from_limbs)
    }

    fn store_at(
        generation: &Generation,
        address: Address,
        value: Self,
        access: Access,
    ) -> Result<(), HeapError> {
        store_limbs(generation, address, value.limbs, access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::HeapBuffer;
    use proptest::prelude::*;

    fn generation() -> Generation {
        Generation::build(0, HeapBuffer::new(64).unwrap())
    }

    #[test]
    fn element_scalars_use_their_view() {
        let g = generation();
        i32::store_at(&g, Address(8), -9, Access::Atomic).unwrap();
        assert_eq!(g.view::<i32>().read(2).unwrap(), -9);
        assert_eq!(i32::load_at(&g, Address(8), Access::Plain).unwrap(), -9);
        assert_eq!(<i32 as Scalar>::NAME, "i32");
    }

    #[test]
    fn u128_is_two_limbs_low_first() {
        let g = generation();
        let v = (7u128 << 64) | 3;
        u128::store_at(&g, Address(16), v, Access::Plain).unwrap();
        assert_eq!(g.view::<u64>().read(2).unwrap(), 3);
        assert_eq!(g.view::<u64>().read(3).unwrap(), 7);
        assert_eq!(u128::load_at(&g, Address(16), Access::Atomic).unwrap(), v);
    }

    #[test]
    fn u256_store_is_all_or_nothing_at_the_edge() {
        let g = generation();
        let err = U256::store_at(&g, Address(40), U256::MAX, Access::Plain).unwrap_err();
        assert!(matches!(err, HeapError::OutOfBounds { len: 32, .. }));
        // Nothing was written before the bounds failure.
        assert_eq!(g.view::<u64>().read(5).unwrap(), 0);
        assert!(U256::load_at(&g, Address(40), Access::Plain).is_err());
    }

    #[test]
    fn u256_byte_conversions() {
        let v = U256::from(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10u128);
        let bytes = v.to_le_bytes();
        assert_eq!(bytes[0], 0x10);
        assert_eq!(bytes[15], 0x01);
        assert_eq!(U256::from_le_bytes(bytes), v);
        assert_eq!(v.to_u128(), Some(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10));
        assert_eq!(U256::MAX.to_u128(), None);
    }

    #[test]
    fn u256_display_is_big_endian_hex() {
        let v = U256::from(255u64);
        assert_eq!(
            v.to_string(),
            "0x00000000000000000000000000000000000000000000000000000000000000ff"
        );
    }

    proptest! {
        #[test]
        fn u256_round_trips(limbs in any::<[u64; 4]>()) {
            let g = generation();
            let v = U256::from_limbs(limbs);
            U256::store_at(&g, Address(32), v, Access::Atomic).unwrap();
            prop_assert_eq!(U256::load_at(&g, Address(32), Access::Atomic).unwrap(), v);
        }
    }
}
