//! [`GrowableBuffer`]: a contiguous, growable sequence over one explicitly managed block.

use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr;

use crate::error::{Error, Result};
use crate::iter::IntoIter;
use crate::raw_block::{MemoryAllocation, RawBlock, abort_on_alloc_failure};
use crate::relocation::{self, Relocate, Relocation};

/// A contiguous, resizable sequence of `T` built for raw append and access throughput.
///
/// The buffer owns a single block of `capacity` slots aligned for `T`. The first `len`
/// slots hold live elements; the rest are uninitialized and never read or dropped.
///
/// When a push finds the block full, the buffer grows to `max(capacity * 2, 4)` slots.
/// The new block is acquired before any element is touched, so a failed allocation leaves
/// the buffer exactly as it was. Elements are then transferred with the strategy `R`:
/// [`Relocate`] (the default) moves them bitwise, [`Duplicate`](crate::Duplicate) clones
/// them and drops the originals only once every clone succeeded.
///
/// Safe, bounds-checked access goes through the slice view ([`Deref`] to `[T]`). The
/// unchecked accessors [`get_unchecked`](Self::get_unchecked) and
/// [`get_unchecked_mut`](Self::get_unchecked_mut) skip the bounds check outside of debug
/// builds (or unless the `checked-index` feature is enabled).
///
/// # Examples
///
/// ```
/// use apte_buffer::GrowableBuffer;
///
/// let mut buf = GrowableBuffer::new();
/// for i in 0..10 {
///     buf.push(i).unwrap();
/// }
/// assert_eq!(buf.len(), 10);
/// assert_eq!(buf.capacity(), 16);
/// assert_eq!(buf.pop(), Ok(9));
/// assert_eq!(buf[0], 0);
/// ```
pub struct GrowableBuffer<T, R = Relocate> {
    block: RawBlock<T>,
    len: usize,
    _p: PhantomData<T>,
    _strategy: PhantomData<fn() -> R>,
}

impl<T> GrowableBuffer<T> {
    /// Creates an empty buffer that relocates its elements on growth. Does not allocate.
    pub const fn new() -> GrowableBuffer<T> {
        GrowableBuffer::empty()
    }

    /// Creates an empty buffer whose block holds exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<GrowableBuffer<T>> {
        let mut buffer = GrowableBuffer::new();
        buffer.reserve(capacity)?;
        Ok(buffer)
    }
}

impl<T, R> GrowableBuffer<T, R> {
    /// Capacity of the first block acquired by growth from an empty buffer.
    pub const INITIAL_CAPACITY: usize = 4;

    /// Factor applied to the capacity on every growth.
    pub const GROWTH_FACTOR: usize = 2;

    /// Creates an empty buffer using the growth strategy `R`. Does not allocate.
    ///
    /// ```
    /// use apte_buffer::{Duplicate, GrowableBuffer};
    ///
    /// let mut buf = GrowableBuffer::<String, Duplicate>::empty();
    /// buf.push("a".to_string()).unwrap();
    /// assert_eq!(buf, ["a"]);
    /// ```
    pub const fn empty() -> GrowableBuffer<T, R> {
        GrowableBuffer {
            block: RawBlock::empty(),
            len: 0,
            _p: PhantomData,
            _strategy: PhantomData,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of element slots in the current block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    /// Returns `true` if the buffer currently owns memory from the global allocator.
    #[inline]
    pub fn has_allocation(&self) -> bool {
        self.block.is_allocated()
    }

    /// Describes the owned block: address, live bytes, total bytes and alignment.
    pub fn memory(&self) -> MemoryAllocation {
        self.block.memory(self.len)
    }

    /// Raw pointer to the first slot. Dangling but aligned if nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.block.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are live and the pointer is non-null and aligned.
        unsafe { std::slice::from_raw_parts(self.block.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.block.as_ptr(), self.len) }
    }

    /// Returns a reference to the element at `index` without a release-mode bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len). This is asserted only in debug
    /// builds, or in every build with the `checked-index` feature.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        check_index(index, self.len);
        unsafe { &*self.block.as_ptr().add(index) }
    }

    /// Returns a mutable reference to the element at `index` without a release-mode bounds
    /// check.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        check_index(index, self.len);
        unsafe { &mut *self.block.as_ptr().add(index) }
    }

    /// Removes the last element and hands it to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContainer`] if the buffer is empty; the buffer is unchanged.
    #[inline]
    pub fn pop(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(Error::EmptyContainer);
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live prefix, so it is read
        // exactly once.
        Ok(unsafe { self.block.as_ptr().add(self.len).read() })
    }

    /// Drops every element past `len` in index order. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: `len < self.len <= capacity`.
            unsafe { self.block.as_ptr().add(len) },
            self.len - len,
        );
        // The tail is unowned from here on, even if one of its destructors panics.
        self.len = len;
        // SAFETY: the tail slots were live and are no longer reachable.
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drops all elements in index order. The block and its capacity are kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Ensures the block holds at least `capacity` elements.
    ///
    /// If `capacity` exceeds the current capacity, a block of exactly `capacity` slots
    /// replaces the current one and the live elements are moved into it in order.
    /// Otherwise this is a no-op; capacity never decreases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if the block cannot be obtained. The buffer
    /// keeps its previous block and elements.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        self.replace_block::<Relocate>(capacity)
    }

    /// Moves the contents out, leaving `self` empty and without an allocation.
    ///
    /// Runs in constant time regardless of the number of elements.
    pub fn take(&mut self) -> GrowableBuffer<T, R> {
        std::mem::replace(self, GrowableBuffer::empty())
    }

    /// Drops the current contents of `self`, then takes over the block, length and
    /// capacity of `source`, which is left empty.
    ///
    /// Assigning a buffer to itself cannot be expressed: the two borrows would alias.
    pub fn assign_from(&mut self, source: &mut GrowableBuffer<T, R>) {
        *self = source.take();
    }

    /// Replaces the block with a new one of `new_capacity` slots, transferring the live
    /// elements with `S`.
    fn replace_block<S: Relocation<T>>(&mut self, new_capacity: usize) -> Result<()> {
        debug_assert!(new_capacity >= self.len);
        let block = RawBlock::<T>::allocate(new_capacity)?;

        // SAFETY: the live prefix and the fresh block are disjoint, and the fresh block has
        // room for `len` elements. If `S` unwinds, `block` is released on the way out and
        // `self` has not been modified.
        unsafe { S::transfer(self.block.as_ptr(), block.as_ptr(), self.len) };

        let old = std::mem::replace(&mut self.block, block);
        if !S::MOVES_ELEMENTS {
            // SAFETY: the originals are still live in `old` and unreachable through `self`.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(old.as_ptr(), self.len));
            }
        }
        log::trace!(
            "replaced block: {} -> {} slots, {} elements ({})",
            old.capacity(),
            new_capacity,
            self.len,
            S::NAME
        );
        Ok(())
    }
}

impl<T, R: Relocation<T>> GrowableBuffer<T, R> {
    /// Appends `value`, growing the block if it is full.
    ///
    /// Amortized O(1); O(n) when growth is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if growth cannot obtain a new block. The
    /// buffer is unchanged and `value` is dropped.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.len == self.block.capacity() {
            self.grow(1)?;
        }
        // SAFETY: `len < capacity`, so slot `len` is in bounds and uninitialized.
        unsafe { self.block.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Grows the block so that at least `additional` more elements fit.
    ///
    /// The new capacity is the largest of twice the current capacity, the initial
    /// capacity and the required capacity. Arithmetic overflow is reported as a failed
    /// request for `usize::MAX` elements.
    #[cold]
    #[inline(never)]
    fn grow(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or_else(|| Error::allocation_failure::<T>(usize::MAX))?;
        let doubled = self.capacity().saturating_mul(Self::GROWTH_FACTOR);
        let new_capacity = doubled.max(Self::INITIAL_CAPACITY).max(required);
        self.replace_block::<R>(new_capacity)
    }
}

impl<T: Clone, R: Relocation<T>> GrowableBuffer<T, R> {
    /// Appends a clone of `value`, leaving the original untouched.
    ///
    /// # Errors
    ///
    /// Same as [`push`](Self::push).
    #[inline]
    pub fn push_cloned(&mut self, value: &T) -> Result<()> {
        self.push(value.clone())
    }

    /// Appends clones of every element of `values`, in order.
    ///
    /// If a clone panics, the elements appended by this call so far are kept.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        if self.capacity() - self.len < values.len() {
            self.grow(values.len())?;
        }
        for value in values {
            // SAFETY: room for all of `values` was ensured above.
            unsafe { self.block.as_ptr().add(self.len).write(value.clone()) };
            self.len += 1;
        }
        Ok(())
    }
}

impl<T: Clone, R> GrowableBuffer<T, R> {
    /// Creates an independent copy with the same capacity and cloned elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if the block for the copy cannot be obtained.
    pub fn try_clone(&self) -> Result<GrowableBuffer<T, R>> {
        let block = RawBlock::<T>::allocate(self.capacity())?;
        // SAFETY: the source prefix is live, the new block has room for it, and the two do
        // not overlap. A panicking clone releases `block` and drops the clones made so far.
        unsafe { relocation::clone_into(self.block.as_ptr(), block.as_ptr(), self.len) };
        Ok(GrowableBuffer {
            block,
            len: self.len,
            _p: PhantomData,
            _strategy: PhantomData,
        })
    }
}

#[inline(always)]
fn check_index(index: usize, len: usize) {
    #[cfg(feature = "checked-index")]
    assert!(index < len, "index {index} out of range for length {len}");
    #[cfg(not(feature = "checked-index"))]
    debug_assert!(index < len, "index {index} out of range for length {len}");
}

impl<T, R> Drop for GrowableBuffer<T, R> {
    fn drop(&mut self) {
        // SAFETY: the first `len` slots are live; the block itself is released afterwards
        // by `RawBlock::drop`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.block.as_ptr(), self.len));
        }
    }
}

impl<T, R> Default for GrowableBuffer<T, R> {
    fn default() -> Self {
        GrowableBuffer::empty()
    }
}

impl<T: Clone, R> Clone for GrowableBuffer<T, R> {
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| abort_on_alloc_failure(err))
    }
}

impl<T, R> Deref for GrowableBuffer<T, R> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R> DerefMut for GrowableBuffer<T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, R> AsRef<[T]> for GrowableBuffer<T, R> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R> AsMut<[T]> for GrowableBuffer<T, R> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, R> Borrow<[T]> for GrowableBuffer<T, R> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, R> BorrowMut<[T]> for GrowableBuffer<T, R> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug, R> fmt::Debug for GrowableBuffer<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GrowableBuffer")
            .field(&self.as_slice())
            .finish()
    }
}

impl<T: PartialEq<U>, U, R, S> PartialEq<GrowableBuffer<U, S>> for GrowableBuffer<T, R> {
    fn eq(&self, other: &GrowableBuffer<U, S>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, R> Eq for GrowableBuffer<T, R> {}

impl<T: PartialEq<U>, U, R> PartialEq<[U]> for GrowableBuffer<T, R> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, R> PartialEq<&[U]> for GrowableBuffer<T, R> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, R, const N: usize> PartialEq<[U; N]> for GrowableBuffer<T, R> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U, R> PartialEq<Vec<U>> for GrowableBuffer<T, R> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Hash, R> Hash for GrowableBuffer<T, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T, R> IntoIterator for GrowableBuffer<T, R> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let len = std::mem::replace(&mut self.len, 0);
        let block = std::mem::replace(&mut self.block, RawBlock::empty());
        IntoIter::new(block, len)
    }
}

impl<'a, T, R> IntoIterator for &'a GrowableBuffer<T, R> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, R> IntoIterator for &'a mut GrowableBuffer<T, R> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, R: Relocation<T>> Extend<T> for GrowableBuffer<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if self.capacity() - self.len < lower {
            if let Err(err) = self.grow(lower) {
                abort_on_alloc_failure(err);
            }
        }
        for value in iter {
            if let Err(err) = self.push(value) {
                abort_on_alloc_failure(err);
            }
        }
    }
}

impl<'a, T: Copy + 'a, R: Relocation<T>> Extend<&'a T> for GrowableBuffer<T, R> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        <Self as Extend<T>>::extend(self, iter.into_iter().copied());
    }
}

impl<T, R: Relocation<T>> FromIterator<T> for GrowableBuffer<T, R> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = GrowableBuffer::empty();
        buffer.extend(iter);
        buffer
    }
}
