//! Heapview: typed, use-after-free-checked references into a flat heap
//! owned by an embedder.
//!
//! The embedder supplies a [`HeapHost`] that owns the linear memory and
//! allocates within it. A [`HeapManager`] wraps the host and hands out
//! references (numbers, pointers, arrays, null-terminated strings) that
//! read and write through a cache of typed views. The views are rebuilt
//! when the host's buffer is replaced, according to the configured
//! [`PollingMode`].
//!
//! # Quick start
//!
//! ```rust
//! use heapview::prelude::*;
//! use heapview_test_utils::BumpHost;
//!
//! let manager = HeapManager::with_defaults(BumpHost::new(1024)).unwrap();
//!
//! let mut bytes = manager.alloc_array_from::<u8>(&[1, 2, 3, 4, 5]).unwrap();
//! let view = bytes.view().unwrap();
//! assert_eq!(view.to_vec().unwrap(), vec![1, 2, 3, 4, 5]);
//! drop(view);
//!
//! bytes.free();
//! assert!(matches!(bytes.read(0), Err(HeapError::UseAfterFree { .. })));
//!
//! let greeting = manager.alloc_string(Encoding::Utf16, "héllo").unwrap();
//! assert_eq!(greeting.read().unwrap(), "héllo");
//! assert_eq!(greeting.allocated_element_count(), 6);
//!
//! let total = manager.alloc_number(0.5f64).unwrap();
//! total.write_atomic(1.25).unwrap();
//! assert_eq!(total.read_atomic().unwrap(), 1.25);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `heapview-core` | Addresses, kinds, encodings, errors, config |
//! | [`buffer`] | `heapview-buffer` | Heap buffers, typed views, generations, atomics |
//! | [`codec`] | `heapview-codec` | Null-terminated string encoding and decoding |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
mod gateway;
pub mod handle;
pub mod manager;
pub mod number;
pub mod pointer;
pub mod registry;
pub mod scope;
mod span;
pub mod string;

/// Core types and errors (`heapview-core`).
pub use heapview_core as types;

/// Heap buffers, generations, and typed views (`heapview-buffer`).
///
/// Implement [`buffer::HeapHost`] to plug in an allocator.
pub use heapview_buffer as buffer;

/// Null-terminated string codec (`heapview-codec`).
pub use heapview_codec as codec;

pub use array::{AddressCell, ArrayFree, ArrayIter, ArrayRef, ArrayView};
pub use handle::HeapRef;
pub use heapview_buffer::{Access, BufferSource, Element, HeapBuffer, HeapHost, Scalar, U256, U8Clamped};
pub use heapview_core::{
    Address, AllocError, ConfigError, ElementKind, Encoding, HeapError, ManagerConfig, PollingMode,
};
pub use manager::HeapManager;
pub use number::NumberRef;
pub use pointer::{PointerFlavor, PointerFree, PointerRef, Ptr32, Ptr64, PtrSafe53, MAX_SAFE_ADDRESS};
pub use registry::{Allocation, ScopeId};
pub use scope::HeapScope;
pub use string::StringRef;

/// Common imports for working with a managed heap.
///
/// ```rust
/// use heapview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Address, ArrayRef, Encoding, HeapError, HeapHost, HeapManager, HeapRef, HeapScope,
        ManagerConfig, NumberRef, PointerFree, PointerRef, PollingMode, Ptr32, Ptr64, StringRef,
        U8Clamped,
    };
}
