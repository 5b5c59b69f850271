//! UTF-8, one byte per unit.

use smallvec::SmallVec;

use crate::engine::EncodeResult;
use crate::units::{UnitSink, UnitSource};

/// Decoded strings up to this many bytes are gathered without a heap
/// allocation before validation.
const INLINE_BYTES: usize = 64;

/// Units needed for `text`, excluding the terminator.
pub fn encoded_len(text: &str) -> usize {
    text.len()
}

/// Encode as many whole characters of `text` as fit in `sink`.
pub fn encode_into<S: UnitSink + ?Sized>(text: &str, sink: &mut S) -> EncodeResult {
    let capacity = sink.unit_count();
    let mut result = EncodeResult::default();
    let mut scratch = [0u8; 4];
    for c in text.chars() {
        let bytes = c.encode_utf8(&mut scratch).as_bytes();
        if result.written + bytes.len() > capacity {
            break;
        }
        for &b in bytes {
            sink.set_unit(result.written, u32::from(b));
            result.written += 1;
        }
        result.read += 1;
    }
    result
}

/// Decode every unit of `source`, replacing malformed sequences with
/// U+FFFD.
pub fn decode<S: UnitSource + ?Sized>(source: &S) -> String {
    let bytes: SmallVec<[u8; INLINE_BYTES]> = (0..source.unit_count())
        // Units wider than a byte cannot be UTF-8; 0xFF is never valid.
        .map(|i| u8::try_from(source.unit(i)).unwrap_or(0xFF))
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn multibyte_characters_are_never_split() {
        // "é" is two bytes; only "a" fits in front of it.
        let mut buf = [0u8; 2];
        let r = encode_into("aé", &mut buf[..]);
        assert_eq!(r, EncodeResult { read: 1, written: 1 });
        assert_eq!(buf, [b'a', 0]);
    }

    #[test]
    fn malformed_input_is_replaced() {
        assert_eq!(decode(&[b'o', 0xC3, b'k'][..]), "o\u{FFFD}k");
        assert_eq!(decode(&[0x41u32, 0x1_0000][..]), "A\u{FFFD}");
    }

    #[test]
    fn long_text_spills_past_inline_scratch() {
        let text = "ü".repeat(100);
        let mut buf = vec![0u8; encoded_len(&text)];
        encode_into(&text, &mut buf[..]);
        assert_eq!(decode(&buf[..]), text);
    }

    proptest! {
        #[test]
        fn round_trips(text in "\\PC*") {
            let mut buf = vec![0u8; encoded_len(&text)];
            let r = encode_into(&text, &mut buf[..]);
            prop_assert_eq!(r.written, buf.len());
            prop_assert_eq!(r.read, text.chars().count());
            prop_assert_eq!(decode(&buf[..]), text);
        }
    }
}
