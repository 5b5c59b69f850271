//! Integration test: null-terminated strings in every encoding.

use heapview::prelude::*;
use heapview_test_utils::BumpHost;
use proptest::prelude::*;

const ALL: [Encoding; 4] = [
    Encoding::Ascii,
    Encoding::Utf8,
    Encoding::Utf16,
    Encoding::Utf32,
];

fn manager() -> HeapManager {
    HeapManager::with_defaults(BumpHost::new(4096)).unwrap()
}

#[test]
fn unicode_round_trips_in_every_unicode_encoding() {
    let manager = manager();
    for text in ["", "plain", "héllo wörld", "日本語", "crab 🦀 claws"] {
        for encoding in [Encoding::Utf8, Encoding::Utf16, Encoding::Utf32] {
            let s = manager.alloc_string(encoding, text).unwrap();
            assert_eq!(s.read().unwrap(), text, "{encoding:?}");
            assert_eq!(s.read_atomic().unwrap(), text, "{encoding:?}");
            assert_eq!(
                s.encoded_element_count().unwrap() + 1,
                s.allocated_element_count()
            );
        }
    }
}

#[test]
fn unit_counts_per_encoding() {
    let manager = manager();
    let text = "a€🦀";
    let counts: Vec<usize> = ALL
        .iter()
        .map(|&e| manager.alloc_string(e, text).unwrap().encoded_element_count().unwrap())
        .collect();
    // ASCII: one unit per char; UTF-8: 1 + 3 + 4; UTF-16: 1 + 1 + 2; UTF-32: 3.
    assert_eq!(counts, vec![3, 8, 4, 3]);
}

#[test]
fn ascii_replaces_non_ascii() {
    let manager = manager();
    let s = manager.alloc_string(Encoding::Ascii, "naïve").unwrap();
    assert_eq!(s.read().unwrap(), "na?ve");

    let raw = manager.alloc(4).unwrap();
    manager.copy_to_heap(raw, &[b'o', 0xE9, b'k', 0]).unwrap();
    assert_eq!(
        manager.read_string(raw, Encoding::Ascii, None).unwrap(),
        "o\u{FFFD}k"
    );
}

#[test]
fn malformed_utf_decodes_to_replacement() {
    let manager = manager();
    let raw = manager.alloc(8).unwrap();
    manager.copy_to_heap(raw, &[b'a', 0xFF, b'b', 0]).unwrap();
    assert_eq!(
        manager.read_string(raw, Encoding::Utf8, None).unwrap(),
        "a\u{FFFD}b"
    );

    // A lone high surrogate.
    let wide = manager.alloc_array_from::<u16>(&[0xD83E, 0x41, 0]).unwrap();
    assert_eq!(
        manager
            .read_string(wide.address(), Encoding::Utf16, None)
            .unwrap(),
        "\u{FFFD}A"
    );
}

// ── Capacity ─────────────────────────────────────────────────

#[test]
fn truncating_writes_fail_without_touching_the_heap() {
    let manager = manager();
    let s = manager.alloc_string_buffer(Encoding::Utf8, 4).unwrap();
    s.write("abc").unwrap();

    let err = s.write("abcd").unwrap_err();
    assert_eq!(
        err,
        HeapError::CapacityExceeded {
            required: 5,
            capacity: 4
        }
    );
    assert_eq!(s.read().unwrap(), "abc");

    // A two-unit UTF-16 character does not fit in the last free unit.
    let wide = manager.alloc_string_buffer(Encoding::Utf16, 2).unwrap();
    assert!(matches!(
        wide.write_atomic("🦀"),
        Err(HeapError::CapacityExceeded {
            required: 3,
            capacity: 2
        })
    ));
    wide.write_atomic("é").unwrap();
    assert_eq!(wide.read().unwrap(), "é");
}

#[test]
fn shorter_rewrites_are_terminated() {
    let manager = manager();
    let s = manager.alloc_string(Encoding::Utf32, "longer text").unwrap();
    s.write("ok").unwrap();
    assert_eq!(s.read().unwrap(), "ok");
    assert_eq!(s.encoded_element_count().unwrap(), 2);
}

#[test]
fn string_buffers_need_room_for_the_terminator() {
    let manager = manager();
    assert!(matches!(
        manager.alloc_string_buffer(Encoding::Utf8, 0),
        Err(HeapError::InvalidArgument { .. })
    ));
    let one = manager.alloc_string_buffer(Encoding::Utf16, 1).unwrap();
    assert_eq!(one.read().unwrap(), "");
    assert!(one.write("a").is_err());
}

// ── Address-scoped access ────────────────────────────────────

#[test]
fn address_scoped_strings_follow_the_same_rules() {
    let manager = manager();
    let raw = manager.alloc(32).unwrap();
    assert_eq!(
        manager.write_string(raw, Encoding::Utf16, "hey", 8).unwrap(),
        3
    );
    assert_eq!(manager.read_string(raw, Encoding::Utf16, Some(8)).unwrap(), "hey");
    assert_eq!(manager.string_len(raw, Encoding::Utf16, None).unwrap(), 3);

    let wrapped = manager.wrap_string(raw, Encoding::Utf16, 8).unwrap();
    assert_eq!(wrapped.read().unwrap(), "hey");
    assert!(manager
        .write_string(Address(raw.get() + 1), Encoding::Utf16, "x", 4)
        .is_err());
}

#[test]
fn missing_terminator_is_reported() {
    let manager = manager();
    let raw = manager.alloc(8).unwrap();
    manager.fill_bytes(raw, 8, b'z').unwrap();

    let err = manager
        .read_string(raw, Encoding::Utf8, Some(8))
        .unwrap_err();
    assert_eq!(
        err,
        HeapError::NullTerminatorNotFound {
            address: raw,
            scanned: 8
        }
    );
    assert_eq!(manager.read_string(raw, Encoding::Utf8, Some(9)).unwrap(), "zzzzzzzz");
}

#[test]
fn unbounded_scan_stops_at_the_end_of_the_heap() {
    let manager = HeapManager::with_defaults(BumpHost::new(64)).unwrap();
    let heap_len = manager.buffer().byte_len();
    let raw = manager.alloc(heap_len - 8).unwrap();
    manager.fill_bytes(raw, heap_len - 8, 1).unwrap();
    assert!(matches!(
        manager.read_string(raw, Encoding::Ascii, None),
        Err(HeapError::NullTerminatorNotFound { scanned, .. }) if scanned == heap_len - 8
    ));
}

proptest! {
    #[test]
    fn any_text_round_trips(text in "\\PC{0,24}") {
        let manager = manager();
        for encoding in [Encoding::Utf8, Encoding::Utf16, Encoding::Utf32] {
            let s = manager.alloc_string(encoding, &text).unwrap();
            prop_assert_eq!(s.read().unwrap(), text.clone());
        }
    }

    #[test]
    fn writes_either_fit_or_change_nothing(text in "[a-zé🦀]{0,12}", capacity in 1usize..10) {
        let manager = manager();
        let s = manager.alloc_string_buffer(Encoding::Utf16, capacity).unwrap();
        s.write("ok").ok();
        let before = s.read().unwrap();
        match s.write(&text) {
            Ok(()) => prop_assert_eq!(s.read().unwrap(), text),
            Err(HeapError::CapacityExceeded { required, capacity: c }) => {
                prop_assert!(required > c);
                prop_assert_eq!(s.read().unwrap(), before);
            }
            Err(e) => prop_assert!(false, "unexpected error {e}"),
        }
    }
}
