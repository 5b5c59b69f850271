//! Integration test: view cache coherency across buffer replacement.
//!
//! Every polling mode is driven against a [`SharedHeap`] whose buffer is
//! swapped out from under the manager, and against a growing
//! [`BumpHost`]. Views of different element kinds over the same buffer
//! must always agree byte-for-byte.

use heapview::prelude::*;
use heapview::HeapBuffer;
use heapview_test_utils::{BumpHost, SharedHeap};

fn manager_over(heap: &SharedHeap, mode: PollingMode) -> HeapManager {
    HeapManager::new(heap.host(), ManagerConfig::new().with_polling_mode(mode)).unwrap()
}

fn copy_of(buffer: &HeapBuffer) -> HeapBuffer {
    let copy = HeapBuffer::new(buffer.byte_len()).unwrap();
    let bytes = buffer.read_bytes(Address::NULL, buffer.byte_len()).unwrap();
    copy.write_bytes(Address::NULL, &bytes).unwrap();
    copy
}

// ── Always ───────────────────────────────────────────────────

#[test]
fn always_follows_every_replacement() {
    let heap = SharedHeap::new(64);
    let manager = manager_over(&heap, PollingMode::Always);
    manager.write(Address(8), 11u32).unwrap();
    let before = manager.generation_number();

    let replacement = copy_of(&heap.buffer());
    heap.replace(replacement.clone());
    manager.write(Address(8), 22u32).unwrap();

    assert!(manager.generation_number() > before);
    assert!(manager.buffer().same_buffer(&replacement));
    assert_eq!(replacement.read_bytes(Address(8), 1).unwrap(), vec![22]);
}

#[test]
fn always_rebuilds_on_growth() {
    let manager = HeapManager::new(
        BumpHost::new(16).keep_old_buffers(),
        ManagerConfig::new().with_polling_mode(PollingMode::Always),
    )
    .unwrap();
    let small = manager.buffer();
    let array = manager.alloc_array::<u64>(32).unwrap();
    array.fill(7).unwrap();
    assert!(manager.buffer().byte_len() >= 8 + 32 * 8);
    assert!(!small.is_detached());
    assert_eq!(array.to_vec().unwrap(), vec![7; 32]);
}

// ── WhenEmpty ────────────────────────────────────────────────

#[test]
fn when_empty_keeps_a_live_buffer() {
    let heap = SharedHeap::new(64);
    let manager = manager_over(&heap, PollingMode::WhenEmpty);
    let original = heap.buffer();

    heap.replace(copy_of(&original));
    manager.write(Address(16), 5u16).unwrap();

    assert!(manager.buffer().same_buffer(&original));
    assert_eq!(original.read_bytes(Address(16), 2).unwrap(), vec![5, 0]);
}

#[test]
fn when_empty_reattaches_after_detachment() {
    let heap = SharedHeap::new(64);
    let manager = manager_over(&heap, PollingMode::WhenEmpty);
    let original = heap.buffer();
    manager.write(Address(8), 1.5f64).unwrap();

    let replacement = copy_of(&original);
    original.detach();
    heap.replace(replacement.clone());

    assert_eq!(manager.read::<f64>(Address(8)).unwrap(), 1.5);
    assert!(manager.buffer().same_buffer(&replacement));
}

#[test]
fn when_empty_follows_a_growing_host() {
    let manager = HeapManager::with_defaults(BumpHost::new(16)).unwrap();
    let first = manager.alloc_number(3u32).unwrap();
    let before = manager.generation_number();
    let big = manager.alloc_array::<u8>(256).unwrap();
    big.write(255, 9).unwrap();

    assert!(manager.generation_number() > before);
    assert_eq!(first.read().unwrap(), 3);
    assert_eq!(big.read(255).unwrap(), 9);
}

// ── Never ────────────────────────────────────────────────────

#[test]
fn never_ignores_replacement_until_refresh() {
    let heap = SharedHeap::new(64);
    let manager = manager_over(&heap, PollingMode::Never);
    let original = heap.buffer();
    let replacement = copy_of(&original);
    heap.replace(replacement.clone());

    manager.write(Address(8), 0xABu8).unwrap();
    assert_eq!(original.read_bytes(Address(8), 1).unwrap(), vec![0xAB]);
    assert_eq!(replacement.read_bytes(Address(8), 1).unwrap(), vec![0]);

    assert!(manager.refresh());
    assert!(!manager.refresh());
    manager.write(Address(8), 0xCDu8).unwrap();
    assert_eq!(replacement.read_bytes(Address(8), 1).unwrap(), vec![0xCD]);
}

#[test]
fn never_rejects_an_empty_initial_buffer() {
    let heap = SharedHeap::new(0);
    let err = HeapManager::new(
        heap.host(),
        ManagerConfig::new().with_polling_mode(PollingMode::Never),
    )
    .unwrap_err();
    assert!(matches!(err, HeapError::InvalidConfig(_)));
}

// ── View congruence ──────────────────────────────────────────

#[test]
fn element_views_share_bytes() {
    let manager = HeapManager::with_defaults(BumpHost::new(64)).unwrap();
    let word = manager.alloc_number(0x0403_0201u32).unwrap();
    let address = word.address();

    let generation = manager.generation();
    let bytes = generation.view::<u8>();
    let index = address.get();
    assert_eq!(bytes.to_vec(index..index + 4).unwrap(), vec![1, 2, 3, 4]);

    bytes.write(index + 3, 0xFF).unwrap();
    assert_eq!(word.read().unwrap(), 0xFF03_0201);
    assert_eq!(manager.read::<u16>(address).unwrap(), 0x0201);
    assert_eq!(manager.read::<i8>(Address(index + 3)).unwrap(), -1);
}

#[test]
fn float_bits_are_visible_through_integer_views() {
    let manager = HeapManager::with_defaults(BumpHost::new(64)).unwrap();
    let value = manager.alloc_number(-2.5f64).unwrap();
    assert_eq!(
        manager.read::<u64>(value.address()).unwrap(),
        (-2.5f64).to_bits()
    );
    manager
        .write_atomic::<u32>(value.address(), 1.0f32.to_bits())
        .unwrap();
    assert_eq!(manager.read::<f32>(value.address()).unwrap(), 1.0);
}
