//! Heap view cache with policy-driven generation rebuilds.
//!
//! [`ViewCache`] holds the current [`Generation`] and decides, per its
//! [`PollingMode`], when to ask a [`BufferSource`] for the current buffer.
//! When the source reports a different buffer, a complete new generation is
//! built and swapped in as one `Arc`, so no caller can ever pair a view from
//! one buffer with a view from another.
//!
//! # Invalidation
//!
//! The generation is rebuilt when:
//! - `WhenEmpty`: the cached buffer is empty (never attached, or detached
//!   by a host that moved to a new instance) and the source now reports a
//!   non-empty one.
//! - `Always`: the source reports a different buffer instance. Any growth
//!   is a new instance, so a changed length always triggers a rebuild.
//! - [`refresh`](ViewCache::refresh) is called and the source reports a
//!   different buffer instance, regardless of mode.
//!
//! `Never` caches are built once and only rebuild through an explicit
//! `refresh`.

use std::sync::Arc;

use heapview_core::PollingMode;

use crate::buffer::HeapBuffer;
use crate::generation::Generation;
use crate::host::BufferSource;

/// Policy-driven holder of the current view generation.
#[derive(Debug)]
pub struct ViewCache {
    mode: PollingMode,
    current: Arc<Generation>,
}

impl ViewCache {
    /// Build generation 0 from the source's current buffer.
    pub fn new(mode: PollingMode, source: &dyn BufferSource) -> Self {
        Self::with_buffer(mode, source.current_buffer())
    }

    /// Build generation 0 over an explicit buffer.
    pub fn with_buffer(mode: PollingMode, buffer: HeapBuffer) -> Self {
        Self {
            mode,
            current: Arc::new(Generation::build(0, buffer)),
        }
    }

    /// The configured polling mode.
    pub fn mode(&self) -> PollingMode {
        self.mode
    }

    /// The cached generation, without polling.
    pub fn current(&self) -> &Arc<Generation> {
        &self.current
    }

    /// Number of the cached generation.
    pub fn generation_number(&self) -> u64 {
        self.current.number()
    }

    /// Apply the polling policy, then return the generation to use for the
    /// next access.
    pub fn generation(&mut self, source: &dyn BufferSource) -> Arc<Generation> {
        match self.mode {
            PollingMode::Never => {}
            PollingMode::WhenEmpty => {
                if self.current.buffer().is_empty() {
                    let buffer = source.current_buffer();
                    if !buffer.is_empty() {
                        self.install(buffer);
                    }
                }
            }
            PollingMode::Always => {
                let buffer = source.current_buffer();
                if !buffer.same_buffer(self.current.buffer()) {
                    self.install(buffer);
                }
            }
        }
        Arc::clone(&self.current)
    }

    /// Poll the source now, ignoring the policy. Returns whether a new
    /// generation was installed.
    pub fn refresh(&mut self, source: &dyn BufferSource) -> bool {
        let buffer = source.current_buffer();
        if buffer.same_buffer(self.current.buffer()) {
            return false;
        }
        self.install(buffer);
        true
    }

    fn install(&mut self, buffer: HeapBuffer) {
        let number = self.current.number() + 1;
        let next = Generation::build(number, buffer);
        tracing::debug!(
            generation = number,
            byte_len = next.byte_len(),
            previous_byte_len = self.current.byte_len(),
            "rebuilt heap views"
        );
        self.current = Arc::new(next);
    }
}
