//! Fixed-width element types that typed views project heap bytes into.
//!
//! [`Element`] is sealed: the set of kinds is exactly the eleven listed in
//! [`ElementKind`]. Each implementation routes loads and stores through the
//! [`atomic`](crate::atomic) layer, so signed integers go through their
//! unsigned cell and floats through their bit pattern.

use std::fmt;

use heapview_core::ElementKind;

use crate::atomic::{self, Access};
use crate::buffer::HeapBuffer;
use crate::generation::Generation;
use crate::view::TypedView;

mod sealed {
    pub trait Sealed {}
}

/// A numeric type with a fixed heap width and a typed view.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static + sealed::Sealed {
    /// The kind descriptor for this type.
    const KIND: ElementKind;

    /// Width of one element in bytes.
    const WIDTH: usize = Self::KIND.width();

    /// The all-zero-bits value.
    const ZERO: Self;

    /// Load the `index`-th element of `buffer`.
    fn load(buffer: &HeapBuffer, index: usize, access: Access) -> Option<Self>;

    /// Store `value` as the `index`-th element of `buffer`.
    fn store(buffer: &HeapBuffer, index: usize, value: Self, access: Access) -> Option<()>;

    /// This kind's view within a generation.
    fn view(generation: &Generation) -> &TypedView<Self>;
}

/// An unsigned byte whose stores saturate into `[0, 255]`.
///
/// Conversions from wider numbers clamp rather than wrap, so
/// `U8Clamped::from(300)` is `U8Clamped(255)` and `U8Clamped::from(-1.0)`
/// is `U8Clamped(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct U8Clamped(pub u8);

impl U8Clamped {
    /// Saturate a float (NaN → 0, half to even).
    pub fn saturating_from_f64(value: f64) -> Self {
        Self(atomic::clamp_to_u8(value))
    }

    /// Saturate an integer.
    pub fn saturating_from_i64(value: i64) -> Self {
        Self(value.clamp(0, 255) as u8)
    }
}

impl From<u8> for U8Clamped {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

impl From<i32> for U8Clamped {
    fn from(v: i32) -> Self {
        Self::saturating_from_i64(v.into())
    }
}

impl From<i64> for U8Clamped {
    fn from(v: i64) -> Self {
        Self::saturating_from_i64(v)
    }
}

impl From<f64> for U8Clamped {
    fn from(v: f64) -> Self {
        Self::saturating_from_f64(v)
    }
}

impl From<U8Clamped> for u8 {
    fn from(v: U8Clamped) -> Self {
        v.0
    }
}

macro_rules! element {
    (
        $ty:ty, $kind:ident, $field:ident, $zero:expr,
        load($lb:ident, $li:ident, $la:ident) => $load:expr,
        store($sb:ident, $si:ident, $sv:ident, $sa:ident) => $store:expr $(,)?
    ) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;
            const ZERO: Self = $zero;

            #[inline]
            fn load($lb: &HeapBuffer, $li: usize, $la: Access) -> Option<Self> {
                $load
            }

            #[inline]
            fn store($sb: &HeapBuffer, $si: usize, $sv: Self, $sa: Access) -> Option<()> {
                $store
            }

            #[inline]
            fn view(generation: &Generation) -> &TypedView<Self> {
                &generation.$field
            }
        }
    };
}

element!(u8, U8, u8_view, 0,
    load(b, i, a) => atomic::load_u8(b, i, a),
    store(b, i, v, a) => atomic::store_u8(b, i, v, a),
);
element!(i8, I8, i8_view, 0,
    load(b, i, a) => atomic::load_u8(b, i, a).map(|v| v as i8),
    store(b, i, v, a) => atomic::store_u8(b, i, v as u8, a),
);
element!(U8Clamped, U8Clamped, u8_clamped_view, U8Clamped(0),
    load(b, i, a) => atomic::load_u8(b, i, a).map(U8Clamped),
    store(b, i, v, a) => atomic::store_u8(b, i, v.0, a),
);
element!(u16, U16, u16_view, 0,
    load(b, i, a) => atomic::load_u16(b, i, a),
    store(b, i, v, a) => atomic::store_u16(b, i, v, a),
);
element!(i16, I16, i16_view, 0,
    load(b, i, a) => atomic::load_u16(b, i, a).map(|v| v as i16),
    store(b, i, v, a) => atomic::store_u16(b, i, v as u16, a),
);
element!(u32, U32, u32_view, 0,
    load(b, i, a) => atomic::load_u32(b, i, a),
    store(b, i, v, a) => atomic::store_u32(b, i, v, a),
);
element!(i32, I32, i32_view, 0,
    load(b, i, a) => atomic::load_u32(b, i, a).map(|v| v as i32),
    store(b, i, v, a) => atomic::store_u32(b, i, v as u32, a),
);
element!(u64, U64, u64_view, 0,
    load(b, i, a) => atomic::load_u64(b, i, a),
    store(b, i, v, a) => atomic::store_u64(b, i, v, a),
);
element!(i64, I64, i64_view, 0,
    load(b, i, a) => atomic::load_u64(b, i, a).map(|v| v as i64),
    store(b, i, v, a) => atomic::store_u64(b, i, v as u64, a),
);
element!(f32, F32, f32_view, 0.0,
    load(b, i, a) => atomic::load_f32(b, i, a),
    store(b, i, v, a) => atomic::store_f32(b, i, v, a),
);
element!(f64, F64, f64_view, 0.0,
    load(b, i, a) => atomic::load_f64(b, i, a),
    store(b, i, v, a) => atomic::store_f64(b, i, v, a),
);
