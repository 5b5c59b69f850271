//! Benchmark fixtures for the heapview workspace.
//!
//! - [`sample_texts`]: strings exercising each width of every encoding
//! - [`bench_manager`]: a manager over a pre-sized [`BumpHost`]
//! - [`seeded_array`]: a populated `f64` array for view benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use heapview::{ArrayRef, HeapError, HeapManager, ManagerConfig, PollingMode};
use heapview_test_utils::BumpHost;

/// Texts for codec benchmarks, labelled for benchmark ids.
///
/// Covers pure ASCII, Latin-1 heavy, CJK, and astral-plane content, so
/// every UTF-8 and UTF-16 code path is hit.
pub fn sample_texts() -> Vec<(&'static str, String)> {
    vec![
        ("ascii", "the quick brown fox jumps over the lazy dog ".repeat(16)),
        ("latin", "größere Übergänge für Käse ".repeat(16)),
        ("cjk", "日本語のテキストを符号化する".repeat(16)),
        ("astral", "🦀🚀𝄞 ".repeat(32)),
    ]
}

/// A manager whose host already holds `heap_len` bytes, so benchmarks do
/// not measure growth.
pub fn bench_manager(heap_len: usize, mode: PollingMode) -> Result<HeapManager, HeapError> {
    HeapManager::new(
        BumpHost::new(heap_len),
        ManagerConfig::new().with_polling_mode(mode),
    )
}

/// An array of `len` doubles holding `0.0, 1.0, 2.0, ...`.
pub fn seeded_array(manager: &HeapManager, len: usize) -> Result<ArrayRef<'_, f64>, HeapError> {
    let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
    manager.alloc_array_from(&values)
}
