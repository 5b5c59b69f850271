//! UTF-32, one 32-bit unit per character.

use crate::engine::EncodeResult;
use crate::units::{UnitSink, UnitSource};

/// Units needed for `text`, excluding the terminator.
pub fn encoded_len(text: &str) -> usize {
    text.chars().count()
}

/// Encode as many characters of `text` as fit in `sink`.
pub fn encode_into<S: UnitSink + ?Sized>(text: &str, sink: &mut S) -> EncodeResult {
    let capacity = sink.unit_count();
    let mut result = EncodeResult::default();
    for c in text.chars().take(capacity) {
        sink.set_unit(result.written, u32::from(c));
        result.read += 1;
        result.written += 1;
    }
    result
}

/// Decode every unit of `source`; surrogates and values above U+10FFFF
/// become U+FFFD.
pub fn decode<S: UnitSource + ?Sized>(source: &S) -> String {
    (0..source.unit_count())
        .map(|i| char::from_u32(source.unit(i)).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
