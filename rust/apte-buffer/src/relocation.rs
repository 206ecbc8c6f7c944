//! Element transfer strategies used when a buffer replaces its block during growth.
//!
//! The strategy is a type parameter of [`GrowableBuffer`](crate::GrowableBuffer), so the
//! choice between moving and cloning is resolved at compile time:
//!
//! - [`Relocate`] moves elements bitwise into the new block. A Rust move cannot fail,
//!   so this is always safe and is the default.
//! - [`Duplicate`] clones every element into the new block and drops the originals only
//!   after all clones succeeded. A panicking `clone` leaves the buffer untouched.

use std::ptr;

use crate::raw_block::ConstructionGuard;

/// Capability for transferring the live prefix of one block into another.
///
/// # Safety
///
/// Implementations must uphold the contract documented on [`Relocation::transfer`]:
/// after a normal return, `dst[..len]` holds `len` live elements in the same order; after
/// an unwind, `dst` holds no live elements and `src` is unchanged.
pub unsafe trait Relocation<T> {
    /// `true` if [`Relocation::transfer`] takes ownership of the source elements, leaving
    /// their slots logically uninitialized. When `false` the source elements stay live
    /// and must be dropped by the caller.
    const MOVES_ELEMENTS: bool;

    /// Short strategy name, used in diagnostics.
    const NAME: &'static str;

    /// Transfers `len` elements from `src` into `dst`.
    ///
    /// # Safety
    ///
    /// `src` must point to `len` live elements, `dst` must be valid for `len` writes, and
    /// the two regions must not overlap.
    unsafe fn transfer(src: *mut T, dst: *mut T, len: usize);
}

/// Bitwise move of every element. Never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Relocate;

/// Element-wise clone, used when the source must stay intact until the transfer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duplicate;

unsafe impl<T> Relocation<T> for Relocate {
    const MOVES_ELEMENTS: bool = true;
    const NAME: &'static str = "relocate";

    #[inline]
    unsafe fn transfer(src: *mut T, dst: *mut T, len: usize) {
        unsafe { ptr::copy_nonoverlapping(src, dst, len) };
    }
}

unsafe impl<T: Clone> Relocation<T> for Duplicate {
    const MOVES_ELEMENTS: bool = false;
    const NAME: &'static str = "duplicate";

    unsafe fn transfer(src: *mut T, dst: *mut T, len: usize) {
        unsafe { clone_into(src, dst, len) };
    }
}

/// Clones `len` elements from `src` into the uninitialized region at `dst`.
///
/// If any clone panics, the clones already written are dropped before the panic
/// propagates; `src` is only ever read.
///
/// # Safety
///
/// Same requirements as [`Relocation::transfer`].
pub(crate) unsafe fn clone_into<T: Clone>(src: *const T, dst: *mut T, len: usize) {
    let mut guard = unsafe { ConstructionGuard::new(dst) };
    for i in 0..len {
        let value = unsafe { &*src.add(i) }.clone();
        unsafe { guard.write(value) };
    }
    guard.finish();
}
