//! Element-kind and text-encoding descriptors.
//!
//! [`ElementKind`] names the eleven fixed-width projections a heap buffer
//! is viewed through. [`Encoding`] names the four null-terminated text
//! encodings the codec engine understands and fixes their unit width.

use std::fmt;

/// One fixed-width numeric interpretation of heap bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 8-bit integer that saturates into `[0, 255]` on store.
    U8Clamped,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE-754 binary32.
    F32,
    /// IEEE-754 binary64.
    F64,
}

impl ElementKind {
    /// Every kind, in view-construction order.
    pub const ALL: [ElementKind; 11] = [
        ElementKind::I8,
        ElementKind::U8,
        ElementKind::U8Clamped,
        ElementKind::I16,
        ElementKind::U16,
        ElementKind::I32,
        ElementKind::U32,
        ElementKind::I64,
        ElementKind::U64,
        ElementKind::F32,
        ElementKind::F64,
    ];

    /// Width of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::U8Clamped => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Whether loads/stores of this kind go through bit reinterpretation
    /// or clamping instead of a direct integer primitive.
    pub const fn is_emulated(self) -> bool {
        matches!(self, Self::U8Clamped | Self::F32 | Self::F64)
    }

    /// Short lowercase name, e.g. `"u32"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::U8Clamped => "u8clamped",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text encoding of a null-terminated heap string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 7-bit ASCII, one byte per character.
    Ascii,
    /// UTF-8, one byte per code unit.
    #[default]
    Utf8,
    /// UTF-16 (little-endian), two bytes per code unit.
    Utf16,
    /// UTF-32 (little-endian), four bytes per code unit.
    Utf32,
}

impl Encoding {
    /// Width of one code unit (and of the terminator) in bytes.
    pub const fn unit_width(self) -> usize {
        match self {
            Self::Ascii | Self::Utf8 => 1,
            Self::Utf16 => 2,
            Self::Utf32 => 4,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
