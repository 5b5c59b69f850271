//! 7-bit ASCII, one unit per character.
//!
//! Characters outside ASCII encode as `?`; units above `0x7F` decode as
//! U+FFFD.

use crate::engine::EncodeResult;
use crate::units::{UnitSink, UnitSource};

const SUBSTITUTE: u32 = b'?' as u32;

/// Units needed for `text`, excluding the terminator.
pub fn encoded_len(text: &str) -> usize {
    text.chars().count()
}

/// Encode as many characters of `text` as fit in `sink`.
pub fn encode_into<S: UnitSink + ?Sized>(text: &str, sink: &mut S) -> EncodeResult {
    let capacity = sink.unit_count();
    let mut result = EncodeResult::default();
    for c in text.chars() {
        if result.written == capacity {
            break;
        }
        let unit = if c.is_ascii() { c as u32 } else { SUBSTITUTE };
        sink.set_unit(result.written, unit);
        result.read += 1;
        result.written += 1;
    }
    result
}

/// Decode every unit of `source`.
pub fn decode<S: UnitSource + ?Sized>(source: &S) -> String {
    (0..source.unit_count())
        .map(|i| match source.unit(i) {
            u @ 0..=0x7F => char::from(u as u8),
            _ => char::REPLACEMENT_CHARACTER,
        })
        .collect()
}
