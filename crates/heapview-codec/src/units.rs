//! Code-unit spans the codec reads from and writes to.
//!
//! Units are passed around as `u32` regardless of the encoding's width;
//! each encoder only produces values that fit its unit width. Spans over
//! shared storage can fail mid-operation; they keep going with zero units
//! and report the first failure through [`UnitSource::status`].

use heapview_core::HeapError;

/// A readable span of code units.
pub trait UnitSource {
    /// Number of units in the span.
    fn unit_count(&self) -> usize;

    /// The unit at `index`. `index` is always `< unit_count()`.
    fn unit(&self, index: usize) -> u32;

    /// The first access failure since the span was built, if any.
    fn status(&self) -> Result<(), HeapError> {
        Ok(())
    }
}

/// A writable span of code units.
pub trait UnitSink: UnitSource {
    /// Overwrite the unit at `index`. `index` is always `< unit_count()`.
    fn set_unit(&mut self, index: usize, unit: u32);
}

/// The first `len` units of another source.
pub struct Prefix<'a, S: UnitSource + ?Sized> {
    source: &'a S,
    len: usize,
}

impl<'a, S: UnitSource + ?Sized> Prefix<'a, S> {
    /// Restrict `source` to its first `len` units (clamped to its length).
    pub fn new(source: &'a S, len: usize) -> Self {
        Self {
            source,
            len: len.min(source.unit_count()),
        }
    }
}

impl<S: UnitSource + ?Sized> UnitSource for Prefix<'_, S> {
    fn unit_count(&self) -> usize {
        self.len
    }

    fn unit(&self, index: usize) -> u32 {
        self.source.unit(index)
    }

    fn status(&self) -> Result<(), HeapError> {
        self.source.status()
    }
}

macro_rules! slice_units {
    ($($int:ty),*) => {
        $(
            impl UnitSource for [$int] {
                fn unit_count(&self) -> usize {
                    self.len()
                }

                fn unit(&self, index: usize) -> u32 {
                    self[index] as u32
                }
            }

            impl UnitSink for [$int] {
                fn set_unit(&mut self, index: usize, unit: u32) {
                    self[index] = unit as $int;
                }
            }
        )*
    };
}

slice_units!(u8, u16, u32);
