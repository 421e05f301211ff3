//! Error types for cube operations.
//!
//! The taxonomy is deliberately small:
//!
//! - [`CubeError::Cancelled`] is a recoverable condition: the calling
//!   thread's [`CancelToken`](crate::CancelToken) fired while the thread
//!   was blocked (or just after admission). All internal bookkeeping is
//!   unwound before this is returned, so retrying is always safe.
//! - The range variants are contract violations. They are rejected before
//!   any locking is attempted, so a bad argument can never block or
//!   disturb in-flight operations.

use thiserror::Error;

/// Error returned by [`Cube::rotate`](crate::Cube::rotate) and
/// [`Cube::inspect`](crate::Cube::inspect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CubeError {
    /// The calling thread was cancelled while blocked.
    #[error("cube operation cancelled")]
    Cancelled,

    /// The face index is not in `0..6`.
    #[error("face index {0} out of range (expected 0..6)")]
    FaceOutOfRange(usize),

    /// The layer index is not in `0..size`.
    #[error("layer index {layer} out of range for cube of size {size}")]
    LayerOutOfRange {
        /// The rejected layer index.
        layer: usize,
        /// The cube's edge length.
        size: usize,
    },
}

impl CubeError {
    /// Returns true if this is the recoverable cancellation case.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
