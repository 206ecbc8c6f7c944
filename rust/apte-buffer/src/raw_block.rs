//! Scoped ownership of a single aligned, uninitialized block of `T` slots.
//!
//! [`RawBlock`] separates acquiring storage from constructing values in it. It never
//! tracks which slots are live and never drops elements; it only guarantees that the
//! memory is released exactly once, on every exit path.

use std::alloc::{Layout, alloc, dealloc};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};

/// Owner of an allocation sized for exactly `capacity` elements of `T`, aligned to
/// `align_of::<T>()`.
///
/// An empty block (`capacity == 0`) owns nothing. Zero-sized element types track their
/// capacity without ever requesting memory.
pub(crate) struct RawBlock<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _p: PhantomData<T>,
}

impl<T> RawBlock<T> {
    const IS_ZST: bool = std::mem::size_of::<T>() == 0;

    /// A block that owns no memory.
    pub const fn empty() -> RawBlock<T> {
        RawBlock {
            ptr: NonNull::dangling(),
            capacity: 0,
            _p: PhantomData,
        }
    }

    /// Requests a block for exactly `capacity` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] when the byte size overflows `isize::MAX`
    /// or the global allocator cannot satisfy the request. Nothing is owned in that case.
    pub fn allocate(capacity: usize) -> Result<RawBlock<T>> {
        if capacity == 0 {
            return Ok(Self::empty());
        }
        let layout = Self::layout(capacity)?;
        if Self::IS_ZST {
            return Ok(RawBlock {
                ptr: NonNull::dangling(),
                capacity,
                _p: PhantomData,
            });
        }

        // SAFETY: `layout` has a non-zero size, checked by the two early returns above.
        let ptr = unsafe { alloc(layout) };
        match NonNull::new(ptr.cast::<T>()) {
            Some(ptr) => Ok(RawBlock {
                ptr,
                capacity,
                _p: PhantomData,
            }),
            None => {
                log::debug!(
                    "allocator returned null for {} bytes (alignment {})",
                    layout.size(),
                    layout.align()
                );
                Err(Error::allocation_failure::<T>(capacity))
            }
        }
    }

    /// Layout of a block holding `capacity` elements.
    pub fn layout(capacity: usize) -> Result<Layout> {
        Layout::array::<T>(capacity).map_err(|_| {
            log::debug!(
                "layout for {capacity} elements of {} bytes is not representable",
                std::mem::size_of::<T>()
            );
            Error::allocation_failure::<T>(capacity)
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to slot 0. Dangling (but well aligned) when nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns `true` if this block holds memory obtained from the global allocator.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.capacity != 0 && !Self::IS_ZST
    }

    /// Describes the owned memory, with `len` live elements at its front.
    pub fn memory(&self, len: usize) -> MemoryAllocation {
        let elem_size = std::mem::size_of::<T>();
        MemoryAllocation {
            ptr: if self.is_allocated() {
                self.ptr.as_ptr() as *const u8
            } else {
                ptr::null()
            },
            len: len * elem_size,
            capacity: self.capacity * elem_size,
            alignment: std::mem::align_of::<T>(),
        }
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        if self.is_allocated() {
            // SAFETY: the memory came from `alloc` with `Layout::array::<T>(capacity)`, which
            // was validated at allocation time and is reconstructed here unchanged.
            unsafe {
                let layout = Layout::from_size_align_unchecked(
                    std::mem::size_of::<T>() * self.capacity,
                    std::mem::align_of::<T>(),
                );
                dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
            }
        }
    }
}

// SAFETY: a block is uniquely owned; sending or sharing it is as safe as sending or
// sharing the `T` values stored in it.
unsafe impl<T: Send> Send for RawBlock<T> {}
unsafe impl<T: Sync> Sync for RawBlock<T> {}

/// Address and size information for the block owned by a buffer.
///
/// `ptr` is null if and only if the buffer owns no allocation.
#[derive(Debug, Clone)]
pub struct MemoryAllocation {
    /// Pointer to the start of the allocated memory, or null.
    pub ptr: *const u8,
    /// Bytes occupied by live elements.
    pub len: usize,
    /// Total bytes of the block.
    pub capacity: usize,
    /// Alignment the block was requested with.
    pub alignment: usize,
}

/// Tracks the constructed prefix of a destination region while it is being filled.
///
/// If a constructor panics, dropping the guard during unwinding drops exactly the
/// elements written so far. [`ConstructionGuard::finish`] disarms it.
pub(crate) struct ConstructionGuard<T> {
    dst: *mut T,
    constructed: usize,
}

impl<T> ConstructionGuard<T> {
    /// # Safety
    ///
    /// `dst` must be valid for writes of every element subsequently passed to
    /// [`ConstructionGuard::write`].
    pub unsafe fn new(dst: *mut T) -> ConstructionGuard<T> {
        ConstructionGuard {
            dst,
            constructed: 0,
        }
    }

    /// Writes `value` into the next slot.
    ///
    /// # Safety
    ///
    /// The next slot must be within the region passed to [`ConstructionGuard::new`].
    #[inline]
    pub unsafe fn write(&mut self, value: T) {
        unsafe { self.dst.add(self.constructed).write(value) };
        self.constructed += 1;
    }

    /// Disarms the guard and returns the number of constructed elements, whose
    /// ownership passes to the caller.
    pub fn finish(self) -> usize {
        let constructed = self.constructed;
        std::mem::forget(self);
        constructed
    }
}

impl<T> Drop for ConstructionGuard<T> {
    fn drop(&mut self) {
        // SAFETY: exactly the first `constructed` slots were written and not handed out.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.dst, self.constructed));
        }
    }
}

/// Escalates an allocation failure from an operation that cannot return [`Result`].
#[cold]
pub(crate) fn abort_on_alloc_failure(err: Error) -> ! {
    match err {
        Error::AllocationFailure {
            capacity,
            elem_size,
            alignment,
        } => match elem_size
            .checked_mul(capacity)
            .and_then(|size| Layout::from_size_align(size, alignment).ok())
        {
            Some(layout) => std::alloc::handle_alloc_error(layout),
            None => panic!("capacity overflow: {capacity} elements of {elem_size} bytes"),
        },
        other => panic!("{other}"),
    }
}
