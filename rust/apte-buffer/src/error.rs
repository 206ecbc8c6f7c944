use thiserror::Error;

/// Result alias used by every fallible [`GrowableBuffer`](crate::GrowableBuffer) operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by [`GrowableBuffer`](crate::GrowableBuffer) operations.
///
/// Out-of-range access through the unchecked accessors is deliberately not part of this
/// taxonomy: it is a caller precondition, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The backing block for `capacity` elements could not be obtained, either because the
    /// allocator returned null or because the byte size is not representable.
    ///
    /// When the requested capacity itself overflows `usize`, `capacity` saturates to
    /// `usize::MAX`.
    #[error(
        "failed to allocate storage for {capacity} elements \
         (element size {elem_size}, alignment {alignment})"
    )]
    AllocationFailure {
        /// Number of element slots requested.
        capacity: usize,
        /// `size_of` the element type.
        elem_size: usize,
        /// `align_of` the element type.
        alignment: usize,
    },

    /// `pop` was called on a buffer with no elements. The buffer is unchanged.
    #[error("pop from an empty buffer")]
    EmptyContainer,
}

impl Error {
    /// Builds an [`Error::AllocationFailure`] for a block of `capacity` elements of `T`.
    pub fn allocation_failure<T>(capacity: usize) -> Error {
        Error::AllocationFailure {
            capacity,
            elem_size: std::mem::size_of::<T>(),
            alignment: std::mem::align_of::<T>(),
        }
    }

    /// Returns `true` for [`Error::AllocationFailure`].
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Error::AllocationFailure { .. })
    }

    /// Returns `true` for [`Error::EmptyContainer`].
    pub fn is_empty_container(&self) -> bool {
        matches!(self, Error::EmptyContainer)
    }
}
