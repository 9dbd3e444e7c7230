//! Application Heap
//!
//! Serves `malloc` and `free` from an arena handed over by the OS.
//!
//! Uses `linked_list_allocator` for heap management.
//!
//! # Rules
//! - `align` must be a non-zero power of two, else `Error::InvalidArg`
//! - A size no layout can hold is `Error::OutOfMemory`
//! - A zero-sized request gets a dangling, aligned pointer that must not
//!   be dereferenced; freeing it does nothing
//! - Exhaustion is `Error::OutOfMemory`, never a panic

use core::alloc::Layout;
use core::ptr::NonNull;

use linked_list_allocator::Heap;

use crate::Error;

/// Arenas smaller than this can't hold the allocator's bookkeeping.
const MIN_ARENA: usize = 4 * core::mem::size_of::<usize>();

/// The heap applications allocate from.
pub struct AppHeap {
    heap: Heap,
    /// Bytes currently handed out.
    in_use: usize,
}

impl AppHeap {
    /// A heap with no memory. Every non-empty `malloc` fails.
    pub const fn empty() -> Self {
        Self {
            heap: Heap::empty(),
            in_use: 0,
        }
    }

    /// Take ownership of `arena` as heap memory.
    pub fn new(arena: &'static mut [u8]) -> Self {
        let mut app_heap = Self::empty();
        if arena.len() >= MIN_ARENA {
            // SAFETY:
            // - The arena is a 'static exclusive borrow, so nothing else
            //   can touch it for the rest of the program
            // - The heap is freshly created and not yet initialised
            unsafe {
                app_heap.heap.init(arena.as_mut_ptr(), arena.len());
            }
        } else {
            log::warn!("heap arena of {} bytes is too small, heap disabled", arena.len());
        }
        app_heap
    }

    /// Total size of the arena.
    pub fn size(&self) -> usize {
        self.heap.size()
    }

    /// Bytes currently allocated.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Allocate `size` bytes aligned to `align`.
    pub fn malloc(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, Error> {
        if !align.is_power_of_two() {
            return Err(Error::InvalidArg);
        }
        // With a good alignment the only remaining failure is a size too big
        // for the address space
        let layout = Layout::from_size_align(size, align).map_err(|_| Error::OutOfMemory)?;
        if size == 0 {
            return NonNull::new(align as *mut u8).ok_or(Error::InvalidArg);
        }

        let ptr = self
            .heap
            .allocate_first_fit(layout)
            .map_err(|_| Error::OutOfMemory)?;
        self.in_use += size;
        Ok(ptr)
    }

    /// Return memory from [`AppHeap::malloc`].
    ///
    /// Null pointers and zero sizes are ignored.
    ///
    /// # Safety
    /// `ptr` must have come from `malloc` on this heap with the same `size`
    /// and `align`, and must not have been freed already.
    pub unsafe fn free(&mut self, ptr: *mut u8, size: usize, align: usize) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        if size == 0 {
            return;
        }
        let Ok(layout) = Layout::from_size_align(size, align) else {
            log::warn!("free with bad layout size={} align={}", size, align);
            return;
        };

        // SAFETY: The caller guarantees ptr and layout match a live
        // allocation from this heap.
        unsafe {
            self.heap.deallocate(ptr, layout);
        }
        self.in_use = self.in_use.saturating_sub(size);
    }
}

impl core::fmt::Debug for AppHeap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppHeap")
            .field("size", &self.size())
            .field("in_use", &self.in_use)
            .finish()
    }
}

impl Default for AppHeap {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;
    use std::vec;

    fn arena(len: usize) -> &'static mut [u8] {
        Box::leak(vec![0u8; len].into_boxed_slice())
    }

    #[test]
    fn test_malloc_free() {
        let mut heap = AppHeap::new(arena(4096));
        assert!(heap.size() > 0 && heap.size() <= 4096);

        let a = heap.malloc(100, 8).unwrap();
        let b = heap.malloc(64, 64).unwrap();
        assert_eq!(a.as_ptr() as usize % 8, 0);
        assert_eq!(b.as_ptr() as usize % 64, 0);
        assert_eq!(heap.in_use(), 164);

        unsafe {
            heap.free(a.as_ptr(), 100, 8);
            heap.free(b.as_ptr(), 64, 64);
        }
        assert_eq!(heap.in_use(), 0);
    }

    #[test]
    fn test_repeated_pairs_do_not_leak() {
        let mut heap = AppHeap::new(arena(1024));
        for _ in 0..1000 {
            let p = heap.malloc(512, 16).unwrap();
            unsafe { heap.free(p.as_ptr(), 512, 16) };
        }
        assert_eq!(heap.in_use(), 0);
    }

    #[test]
    fn test_exhaustion() {
        let mut heap = AppHeap::new(arena(256));
        assert_eq!(heap.malloc(4096, 8), Err(Error::OutOfMemory));
        assert_eq!(AppHeap::empty().malloc(1, 1), Err(Error::OutOfMemory));
    }

    #[test]
    fn test_bad_alignment() {
        let mut heap = AppHeap::new(arena(256));
        assert_eq!(heap.malloc(8, 0), Err(Error::InvalidArg));
        assert_eq!(heap.malloc(8, 3), Err(Error::InvalidArg));
        assert_eq!(heap.malloc(usize::MAX, 3), Err(Error::InvalidArg));
    }

    #[test]
    fn test_oversized_request_is_out_of_memory() {
        let mut heap = AppHeap::new(arena(256));
        assert_eq!(heap.malloc(usize::MAX, 8), Err(Error::OutOfMemory));
        assert_eq!(heap.malloc(isize::MAX as usize, 1 << 12), Err(Error::OutOfMemory));
        assert_eq!(heap.in_use(), 0);
    }

    #[test]
    fn test_zero_size() {
        let mut heap = AppHeap::new(arena(256));
        let p = heap.malloc(0, 16).unwrap();
        assert_eq!(p.as_ptr() as usize, 16);
        unsafe { heap.free(p.as_ptr(), 0, 16) };
        unsafe { heap.free(core::ptr::null_mut(), 8, 8) };
        assert_eq!(heap.in_use(), 0);
    }

    #[test]
    fn test_tiny_arena() {
        let mut heap = AppHeap::new(arena(4));
        assert_eq!(heap.size(), 0);
        assert_eq!(heap.malloc(1, 1), Err(Error::OutOfMemory));
    }
}
