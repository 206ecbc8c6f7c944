//! A contiguous, growable sequence container with explicit, alignment-correct memory
//! management.
//!
//! [`GrowableBuffer<T>`] is a drop-in style replacement for `Vec<T>` that favors raw
//! throughput: storage is acquired separately from element construction, capacity doubles
//! starting at 4 slots, and the indexed fast path carries no release-mode bounds check.
//!
//! # Modules
//!
//! - [`error`]: the [`Error`] taxonomy and the crate [`Result`] alias
//! - [`relocation`]: the compile-time choice between moving and cloning elements when the
//!   buffer grows
//!
//! # Features
//!
//! - `checked-index`: keep the bounds assertion of
//!   [`GrowableBuffer::get_unchecked`] and [`GrowableBuffer::get_unchecked_mut`] in
//!   release builds.

pub mod error;
mod growable_buffer;
mod iter;
mod raw_block;
pub mod relocation;

pub use error::{Error, Result};
pub use growable_buffer::GrowableBuffer;
pub use iter::IntoIter;
pub use raw_block::MemoryAllocation;
pub use relocation::{Duplicate, Relocate, Relocation};
