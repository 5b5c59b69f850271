//! Binding heap strings to codec unit spans.

use heapview_buffer::{Access, Element, Generation, TypedView};
use heapview_codec::{find_terminator, UnitSink, ViewSpan};
use heapview_core::{Address, Encoding, HeapError};

/// Run `f` over the units of `encoding` at `address`: exactly `len` units
/// when given, otherwise every unit to the end of the heap.
pub(crate) fn with_units<R>(
    generation: &Generation,
    address: Address,
    encoding: Encoding,
    len: Option<usize>,
    access: Access,
    f: impl FnOnce(&mut dyn UnitSink) -> R,
) -> Result<R, HeapError> {
    match encoding {
        Encoding::Ascii | Encoding::Utf8 => {
            let mut span = view_span(generation.view::<u8>(), address, len)?.with_access(access);
            Ok(f(&mut span))
        }
        Encoding::Utf16 => {
            let mut span = view_span(generation.view::<u16>(), address, len)?.with_access(access);
            Ok(f(&mut span))
        }
        Encoding::Utf32 => {
            let mut span = view_span(generation.view::<u32>(), address, len)?.with_access(access);
            Ok(f(&mut span))
        }
    }
}

/// Units before the first zero, or `NullTerminatorNotFound`.
pub(crate) fn terminator(
    span: &dyn UnitSink,
    limit: Option<usize>,
    origin: Address,
) -> Result<usize, HeapError> {
    find_terminator(span, limit)?.ok_or_else(|| HeapError::NullTerminatorNotFound {
        address: origin,
        scanned: limit.map_or(span.unit_count(), |l| l.min(span.unit_count())),
    })
}

fn view_span<K: Element>(
    view: &TypedView<K>,
    address: Address,
    len: Option<usize>,
) -> Result<ViewSpan<'_, K>, HeapError> {
    if !address.is_aligned_to(K::WIDTH) {
        return Err(HeapError::invalid(format!(
            "{address} is not aligned to the {}-byte code unit",
            K::WIDTH
        )));
    }
    let start = TypedView::<K>::index_of(address);
    match len {
        Some(len) => ViewSpan::new(view, start, len),
        None => ViewSpan::to_end(view, start),
    }
}
