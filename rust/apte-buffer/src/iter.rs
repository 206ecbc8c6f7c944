use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr;

use crate::raw_block::RawBlock;

/// By-value iterator over the elements of a [`GrowableBuffer`](crate::GrowableBuffer).
///
/// Owns the buffer's block. Elements that were not yielded are dropped, in index order,
/// when the iterator is dropped; the block is released afterwards.
pub struct IntoIter<T> {
    block: RawBlock<T>,
    /// Index of the next element yielded from the front.
    start: usize,
    /// One past the index of the next element yielded from the back.
    end: usize,
    _p: PhantomData<T>,
}

impl<T> IntoIter<T> {
    /// Takes ownership of `block`, whose first `len` slots are live.
    pub(crate) fn new(block: RawBlock<T>, len: usize) -> IntoIter<T> {
        debug_assert!(len <= block.capacity());
        IntoIter {
            block,
            start: 0,
            end: len,
            _p: PhantomData,
        }
    }

    /// Returns the elements that have not been yielded yet.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots `start..end` are live.
        unsafe {
            std::slice::from_raw_parts(self.block.as_ptr().add(self.start), self.end - self.start)
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: slot `start` is live and leaves the live range before it is read again.
        let value = unsafe { self.block.as_ptr().add(self.start).read() };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.start;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot `end` was live and is now outside the live range.
        Some(unsafe { self.block.as_ptr().add(self.end).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = ptr::slice_from_raw_parts_mut(
            // SAFETY: `start <= end <= capacity`.
            unsafe { self.block.as_ptr().add(self.start) },
            self.end - self.start,
        );
        self.start = self.end;
        // SAFETY: the remaining slots are live and no longer reachable.
        unsafe { ptr::drop_in_place(remaining) };
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
