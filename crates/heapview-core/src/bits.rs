//! Bit reinterpretation between floats and same-width unsigned integers.
//!
//! The atomic layer has no float primitives, so float cells are stored as
//! their raw bit pattern through an integer cell of the same width.
//! Conversion is lossless in both directions, NaN payloads included.

/// A value with a same-width unsigned-integer bit pattern.
pub trait BitPattern: Copy {
    /// The unsigned integer type of the same width.
    type Bits: Copy;

    /// Reinterpret the value's bits as an integer.
    fn to_pattern(self) -> Self::Bits;

    /// Reinterpret an integer's bits as a value.
    fn from_pattern(bits: Self::Bits) -> Self;
}

impl BitPattern for f32 {
    type Bits = u32;

    #[inline]
    fn to_pattern(self) -> u32 {
        self.to_bits()
    }

    #[inline]
    fn from_pattern(bits: u32) -> f32 {
        f32::from_bits(bits)
    }
}

impl BitPattern for f64 {
    type Bits = u64;

    #[inline]
    fn to_pattern(self) -> u64 {
        self.to_bits()
    }

    #[inline]
    fn from_pattern(bits: u64) -> f64 {
        f64::from_bits(bits)
    }
}
