//! Core types for typed access to an externally owned heap.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: heap [`Address`]es,
//! element and text-encoding descriptors, the bit-reinterpretation unit
//! used by the atomic layer, the error taxonomy, and manager configuration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod address;
pub mod bits;
pub mod config;
pub mod error;
pub mod kind;

pub use address::{Address, DEFAULT_ALIGNMENT};
pub use bits::BitPattern;
pub use config::{ManagerConfig, PollingMode};
pub use error::{AllocError, ConfigError, HeapError};
pub use kind::{ElementKind, Encoding};
