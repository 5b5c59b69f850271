//! Error types for heap access.
//!
//! Every fallible operation in the workspace returns [`HeapError`]. Hosts
//! report allocation failure through [`AllocError`], which the gateway
//! wraps in [`HeapError::AllocationFailed`]; configuration problems are
//! [`ConfigError`]s wrapped in [`HeapError::InvalidConfig`].

use std::error::Error;
use std::fmt;

use crate::address::Address;

/// Errors raised by heap access, references, and the string codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// An operation was attempted on a reference that has been freed.
    UseAfterFree {
        /// Which kind of reference was used (`"number"`, `"array"`, ...).
        reference: &'static str,
    },
    /// A write would not fit in the destination span or capacity.
    CapacityExceeded {
        /// Elements required, including any terminator.
        required: usize,
        /// Elements available.
        capacity: usize,
    },
    /// A scan for a zero terminator reached its limit without finding one.
    NullTerminatorNotFound {
        /// Address the scan started at.
        address: Address,
        /// Number of elements scanned.
        scanned: usize,
    },
    /// A value of the wrong shape or range was supplied.
    InvalidArgument {
        /// Description of what was wrong.
        reason: String,
    },
    /// The host could not satisfy an allocation request.
    AllocationFailed(AllocError),
    /// An access touched bytes outside the current heap buffer.
    OutOfBounds {
        /// First byte of the access.
        address: Address,
        /// Length of the access in bytes.
        len: usize,
        /// Byte length of the buffer at the time of the access.
        buffer_len: usize,
    },
    /// The manager configuration was rejected.
    InvalidConfig(ConfigError),
}

impl HeapError {
    /// Shorthand for [`HeapError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseAfterFree { reference } => {
                write!(f, "use after free: {reference} reference has been freed")
            }
            Self::CapacityExceeded { required, capacity } => {
                write!(
                    f,
                    "capacity exceeded: {required} elements required, capacity {capacity}"
                )
            }
            Self::NullTerminatorNotFound { address, scanned } => {
                write!(
                    f,
                    "no null terminator within {scanned} elements of address {address}"
                )
            }
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::AllocationFailed(e) => write!(f, "allocation failed: {e}"),
            Self::OutOfBounds {
                address,
                len,
                buffer_len,
            } => {
                write!(
                    f,
                    "access of {len} bytes at {address} is outside the {buffer_len}-byte heap"
                )
            }
            Self::InvalidConfig(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl Error for HeapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AllocationFailed(e) => Some(e),
            Self::InvalidConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocError> for HeapError {
    fn from(e: AllocError) -> Self {
        Self::AllocationFailed(e)
    }
}

impl From<ConfigError> for HeapError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e)
    }
}

/// Failure reported by a host's `allocate` capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// Number of bytes requested.
    pub requested: usize,
    /// Why the host refused, e.g. `"heap cannot grow past 65536 bytes"`.
    pub reason: String,
}

impl AllocError {
    /// Create an allocation error for a request of `requested` bytes.
    pub fn new(requested: usize, reason: impl Into<String>) -> Self {
        Self {
            requested,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes requested: {}", self.requested, self.reason)
    }
}

impl Error for AllocError {}

/// Errors detected by [`ManagerConfig::validate`](crate::ManagerConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `PollingMode::Never` was requested while the host's buffer is
    /// empty, so the view cache could never serve an access.
    NeverPollingOnEmptyBuffer,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeverPollingOnEmptyBuffer => {
                write!(f, "polling mode never requires a non-empty heap at construction")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_details() {
        let e = HeapError::CapacityExceeded {
            required: 6,
            capacity: 5,
        };
        assert_eq!(
            e.to_string(),
            "capacity exceeded: 6 elements required, capacity 5"
        );

        let e = HeapError::NullTerminatorNotFound {
            address: Address(16),
            scanned: 4,
        };
        assert!(e.to_string().contains("0x10"));
    }

    #[test]
    fn alloc_error_is_the_source() {
        let e: HeapError = AllocError::new(64, "out of pages").into();
        let source = e.source().unwrap();
        assert_eq!(source.to_string(), "64 bytes requested: out of pages");
    }

    #[test]
    fn invalid_shorthand() {
        assert_eq!(
            HeapError::invalid("bad"),
            HeapError::InvalidArgument {
                reason: "bad".to_string()
            }
        );
    }
}
