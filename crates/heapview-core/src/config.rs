//! Manager configuration parameters.

use std::fmt;

use crate::error::ConfigError;

/// When the view cache asks the host for the current buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PollingMode {
    /// Build views once at construction and never rebuild. The caller
    /// asserts the buffer is not replaced for the manager's lifetime.
    Never,
    /// Re-poll only while the cached buffer is empty (detached), and
    /// rebuild as soon as the host returns a non-empty buffer.
    #[default]
    WhenEmpty,
    /// Re-poll before every access and rebuild whenever the host returns
    /// a different buffer.
    Always,
}

impl fmt::Display for PollingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Never => "never",
            Self::WhenEmpty => "when-empty",
            Self::Always => "always",
        })
    }
}

/// Configuration for a heap manager.
///
/// All values are fixed once the manager is constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Zero-fill every region returned by the host before handing it out.
    ///
    /// Default: `true`.
    pub clear_allocated_regions: bool,

    /// View-cache refresh policy.
    ///
    /// Default: [`PollingMode::WhenEmpty`].
    pub polling_mode: PollingMode,

    /// Deallocate a gateway-allocated reference's region when the
    /// reference is dropped without an explicit `free()`.
    ///
    /// Default: `false`. Scopes are the deterministic alternative.
    pub reclaim_on_drop: bool,
}

impl ManagerConfig {
    /// Default for [`ManagerConfig::clear_allocated_regions`].
    pub const DEFAULT_CLEAR_ALLOCATED_REGIONS: bool = true;

    /// Default for [`ManagerConfig::reclaim_on_drop`].
    pub const DEFAULT_RECLAIM_ON_DROP: bool = false;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            clear_allocated_regions: Self::DEFAULT_CLEAR_ALLOCATED_REGIONS,
            polling_mode: PollingMode::default(),
            reclaim_on_drop: Self::DEFAULT_RECLAIM_ON_DROP,
        }
    }

    /// Set [`ManagerConfig::clear_allocated_regions`].
    pub fn with_clear_allocated_regions(mut self, clear: bool) -> Self {
        self.clear_allocated_regions = clear;
        self
    }

    /// Set [`ManagerConfig::polling_mode`].
    pub fn with_polling_mode(mut self, mode: PollingMode) -> Self {
        self.polling_mode = mode;
        self
    }

    /// Set [`ManagerConfig::reclaim_on_drop`].
    pub fn with_reclaim_on_drop(mut self, reclaim: bool) -> Self {
        self.reclaim_on_drop = reclaim;
        self
    }

    /// Check the config against the host's buffer at construction time.
    ///
    /// `initial_buffer_len` is the byte length of the buffer the host
    /// reports when the manager is built.
    pub fn validate(&self, initial_buffer_len: usize) -> Result<(), ConfigError> {
        if self.polling_mode == PollingMode::Never && initial_buffer_len == 0 {
            return Err(ConfigError::NeverPollingOnEmptyBuffer);
        }
        Ok(())
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}
