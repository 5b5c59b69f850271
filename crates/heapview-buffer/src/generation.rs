//! One congruent set of typed views over a single buffer instance.

use std::fmt;

use crate::buffer::HeapBuffer;
use crate::element::{Element, U8Clamped};
use crate::view::TypedView;

/// Every typed view over one [`HeapBuffer`] instance.
///
/// A generation is built whole by [`Generation::build`] and never mutated
/// afterwards, so two views taken from the same generation always project
/// the same bytes. The view cache replaces generations, it never patches
/// them.
pub struct Generation {
    number: u64,
    buffer: HeapBuffer,
    pub(crate) i8_view: TypedView<i8>,
    pub(crate) u8_view: TypedView<u8>,
    pub(crate) u8_clamped_view: TypedView<U8Clamped>,
    pub(crate) i16_view: TypedView<i16>,
    pub(crate) u16_view: TypedView<u16>,
    pub(crate) i32_view: TypedView<i32>,
    pub(crate) u32_view: TypedView<u32>,
    pub(crate) i64_view: TypedView<i64>,
    pub(crate) u64_view: TypedView<u64>,
    pub(crate) f32_view: TypedView<f32>,
    pub(crate) f64_view: TypedView<f64>,
}

impl Generation {
    /// Build generation `number` over `buffer`.
    pub fn build(number: u64, buffer: HeapBuffer) -> Self {
        Self {
            number,
            i8_view: TypedView::new(&buffer),
            u8_view: TypedView::new(&buffer),
            u8_clamped_view: TypedView::new(&buffer),
            i16_view: TypedView::new(&buffer),
            u16_view: TypedView::new(&buffer),
            i32_view: TypedView::new(&buffer),
            u32_view: TypedView::new(&buffer),
            i64_view: TypedView::new(&buffer),
            u64_view: TypedView::new(&buffer),
            f32_view: TypedView::new(&buffer),
            f64_view: TypedView::new(&buffer),
            buffer,
        }
    }

    /// Monotonic generation number (0 for the set built at construction).
    pub fn number(&self) -> u64 {
        self.number
    }

    /// The buffer every view in this generation projects.
    pub fn buffer(&self) -> &HeapBuffer {
        &self.buffer
    }

    /// Byte length of the buffer.
    pub fn byte_len(&self) -> usize {
        self.buffer.byte_len()
    }

    /// The view of kind `K`.
    pub fn view<K: Element>(&self) -> &TypedView<K> {
        K::view(self)
    }

    /// The byte view, used for zero-fill and raw copies.
    pub fn bytes(&self) -> &TypedView<u8> {
        &self.u8_view
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("number", &self.number)
            .field("buffer", &self.buffer)
            .finish()
    }
}
