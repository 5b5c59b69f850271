//! Null-terminated string codec for heap text.
//!
//! Encodes and decodes ASCII, UTF-8, UTF-16, and UTF-32 text directly
//! against code-unit spans, most commonly [`ViewSpan`]s over a heap
//! generation. The codec never allocates heap memory and never writes past
//! the span it is given.
//!
//! # Write path
//!
//! [`write_terminated`] needs `encoded_len(text) + 1` units. If the span
//! is smaller it fails with `CapacityExceeded` *before* writing anything;
//! otherwise it encodes the text and writes a zero terminator directly
//! after it. Text containing U+0000 is rejected up front.
//!
//! # Read path
//!
//! [`read_terminated`] scans for the first zero unit (bounded by an
//! optional maximum, otherwise by the end of the span) and decodes the
//! units before it.
//!
//! Both paths check [`UnitSource::status`] when done, so a span whose
//! buffer was detached mid-operation yields its error, not a partial
//! result.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod ascii;
pub mod engine;
pub mod span;
pub mod units;
pub mod utf16;
pub mod utf32;
pub mod utf8;

pub use engine::{
    decode, encode_into, encoded_len, find_terminator, read_terminated, write_terminated,
    EncodeResult,
};
pub use span::ViewSpan;
pub use units::{UnitSink, UnitSource};
