//! Encoding dispatch and the null-terminated read/write paths.

use heapview_core::{Address, Encoding, HeapError};

use crate::units::{Prefix, UnitSink, UnitSource};
use crate::{ascii, utf16, utf32, utf8};

/// Progress of one [`encode_into`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeResult {
    /// Source characters consumed.
    pub read: usize,
    /// Destination units written.
    pub written: usize,
}

impl EncodeResult {
    /// Whether fewer than `total_chars` characters were consumed.
    pub fn is_truncated(&self, total_chars: usize) -> bool {
        self.read < total_chars
    }
}

/// Units `text` occupies in `encoding`, excluding the terminator.
pub fn encoded_len(encoding: Encoding, text: &str) -> usize {
    match encoding {
        Encoding::Ascii => ascii::encoded_len(text),
        Encoding::Utf8 => utf8::encoded_len(text),
        Encoding::Utf16 => utf16::encoded_len(text),
        Encoding::Utf32 => utf32::encoded_len(text),
    }
}

/// Encode as many whole characters of `text` as fit in `sink`. No
/// terminator is written.
pub fn encode_into<S: UnitSink + ?Sized>(encoding: Encoding, text: &str, sink: &mut S) -> EncodeResult {
    match encoding {
        Encoding::Ascii => ascii::encode_into(text, sink),
        Encoding::Utf8 => utf8::encode_into(text, sink),
        Encoding::Utf16 => utf16::encode_into(text, sink),
        Encoding::Utf32 => utf32::encode_into(text, sink),
    }
}

/// Decode every unit of `source`.
pub fn decode<S: UnitSource + ?Sized>(encoding: Encoding, source: &S) -> String {
    match encoding {
        Encoding::Ascii => ascii::decode(source),
        Encoding::Utf8 => utf8::decode(source),
        Encoding::Utf16 => utf16::decode(source),
        Encoding::Utf32 => utf32::decode(source),
    }
}

/// Index of the first zero unit among the first `limit` units of `source`
/// (all of them when `limit` is `None`).
///
/// Fails with the source's own error if any unit could not be read.
pub fn find_terminator<S: UnitSource + ?Sized>(
    source: &S,
    limit: Option<usize>,
) -> Result<Option<usize>, HeapError> {
    let end = scan_end(source, limit);
    let found = (0..end).find(|&i| source.unit(i) == 0);
    source.status()?;
    Ok(found)
}

/// Encode `text` followed by a zero terminator.
///
/// Returns the number of units written before the terminator. Fails with
/// [`HeapError::CapacityExceeded`], leaving `sink` untouched, when the
/// text plus terminator does not fit, and with
/// [`HeapError::InvalidArgument`] when `text` contains U+0000, which no
/// reader could get back.
pub fn write_terminated<S: UnitSink + ?Sized>(
    encoding: Encoding,
    text: &str,
    sink: &mut S,
) -> Result<usize, HeapError> {
    if let Some(at) = text.find('\0') {
        return Err(HeapError::invalid(format!(
            "text contains a NUL character at byte {at}"
        )));
    }
    let required = encoded_len(encoding, text) + 1;
    let capacity = sink.unit_count();
    if required > capacity {
        return Err(HeapError::CapacityExceeded { required, capacity });
    }
    sink.status()?;
    let result = encode_into(encoding, text, sink);
    debug_assert_eq!(result.written + 1, required);
    sink.set_unit(result.written, 0);
    sink.status()?;
    Ok(result.written)
}

/// Decode the units before the first zero within `limit` units of
/// `source` (or the whole span when `limit` is `None`).
///
/// `origin` is the heap address of `source`'s first unit and is only used
/// to report [`HeapError::NullTerminatorNotFound`].
pub fn read_terminated<S: UnitSource + ?Sized>(
    encoding: Encoding,
    source: &S,
    limit: Option<usize>,
    origin: Address,
) -> Result<String, HeapError> {
    match find_terminator(source, limit)? {
        Some(len) => {
            let text = decode(encoding, &Prefix::new(source, len));
            source.status()?;
            Ok(text)
        }
        None => Err(HeapError::NullTerminatorNotFound {
            address: origin,
            scanned: scan_end(source, limit),
        }),
    }
}

fn scan_end<S: UnitSource + ?Sized>(source: &S, limit: Option<usize>) -> usize {
    limit.map_or(source.unit_count(), |l| l.min(source.unit_count()))
}
