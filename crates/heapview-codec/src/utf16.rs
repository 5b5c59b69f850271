//! UTF-16, one 16-bit unit per BMP character and a surrogate pair
//! otherwise.

use crate::engine::EncodeResult;
use crate::units::{UnitSink, UnitSource};

/// Units needed for `text`, excluding the terminator.
pub fn encoded_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Encode as many whole characters of `text` as fit in `sink`. A
/// surrogate pair is written entirely or not at all.
pub fn encode_into<S: UnitSink + ?Sized>(text: &str, sink: &mut S) -> EncodeResult {
    let capacity = sink.unit_count();
    let mut result = EncodeResult::default();
    let mut scratch = [0u16; 2];
    for c in text.chars() {
        let units = c.encode_utf16(&mut scratch);
        if result.written + units.len() > capacity {
            break;
        }
        for &u in units.iter() {
            sink.set_unit(result.written, u32::from(u));
            result.written += 1;
        }
        result.read += 1;
    }
    result
}

/// Decode every unit of `source`; unpaired surrogates become U+FFFD.
pub fn decode<S: UnitSource + ?Sized>(source: &S) -> String {
    let units = (0..source.unit_count()).map(|i| source.unit(i) as u16);
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
