//! Shared heap buffers and typed, generation-numbered views over them.
//!
//! A [`HeapBuffer`] is a contiguous byte region owned by an embedder. It
//! can be replaced at any time (growth, detachment), so every access goes
//! through a [`Generation`]: one complete, congruent set of typed views
//! over a single buffer instance. The [`ViewCache`] decides, per its
//! [`PollingMode`](heapview_core::PollingMode), when to ask the embedder
//! for the current buffer and swaps in a fresh generation as a unit.
//!
//! # Architecture
//!
//! ```text
//! ViewCache (polling policy, generation counter)
//! └── Arc<Generation> (swapped whole on buffer replacement)
//!     ├── TypedView<K> × 11 (i8 … f64, clamped u8)
//!     └── HeapBuffer (Arc-shared, Send + Sync)
//!         └── RawHeap (8-byte aligned atomic words)
//! ```
//!
//! # Atomicity
//!
//! Every element access, plain or atomic, is a single atomic load or store
//! on a cell of the element's width; plain access uses `Relaxed` ordering
//! and atomic access uses `SeqCst`. Floats and clamped bytes have no native
//! primitive and are emulated through their integer bit patterns in
//! [`atomic`].
//!
//! Overlapping views alias the same bytes, but only same-width accesses
//! may race. Agents that share a buffer must agree on the element kind of
//! each cell they touch concurrently, and hand a cell over to a different
//! width only after synchronising, e.g. through a flag written and read
//! with [`Access::Atomic`]. Byte-level buffer operations count as `u8`
//! accesses.
//!
//! This crate contains the workspace's only `unsafe` code, confined to the
//! private `raw` module.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod atomic;
pub mod buffer;
pub mod cache;
pub mod element;
pub mod generation;
pub mod host;
mod raw;
pub mod view;
pub mod wide;

pub use atomic::Access;
pub use buffer::HeapBuffer;
pub use cache::ViewCache;
pub use element::{Element, U8Clamped};
pub use generation::Generation;
pub use host::{BufferSource, HeapHost};
pub use view::TypedView;
pub use wide::{Scalar, U256};
