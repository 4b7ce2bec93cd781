//! Filesystem error type.

use ember_hal::HalError;

/// Result type for filesystem operations
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur in filesystem operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsError {
    /// Flash I/O failure; aborts the operation, never retried internally
    Io(HalError),
    /// A transient buffer could not be acquired (non-fatal to GC cycles)
    OutOfMemory,
    /// No amount of garbage collection can produce the requested space
    Full,
    /// On-flash or in-RAM structure failed a consistency check
    Corrupt,
    /// No object with the requested id
    NotFound,
    /// Invalid parameter provided
    InvalidParam,
}

impl From<HalError> for FsError {
    fn from(err: HalError) -> Self {
        Self::Io(err)
    }
}
