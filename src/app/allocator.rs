//! Application Allocator
//!
//! A `GlobalAlloc` that forwards to the table's `malloc` and `free`, so an
//! application can use `alloc` collections.
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: ApiAllocator = ApiAllocator::new();
//!
//! extern "C" fn app_entry(api: &'static Api) -> i32 {
//!     ALLOCATOR.bind(api);
//!     // ...
//! }
//! ```

use core::alloc::{GlobalAlloc, Layout};
use core::ptr;

use spin::Once;

use crate::Api;

/// Allocator backed by an [`Api`] table.
///
/// Until it is bound every allocation fails.
pub struct ApiAllocator {
    api: Once<&'static Api>,
}

impl ApiAllocator {
    pub const fn new() -> Self {
        Self { api: Once::new() }
    }

    /// Attach the table. Only the first call has any effect.
    ///
    /// Returns true if this call bound the allocator.
    pub fn bind(&self, api: &'static Api) -> bool {
        let mut bound = false;
        self.api.call_once(|| {
            bound = true;
            api
        });
        bound
    }

    /// Has a table been attached?
    pub fn is_bound(&self) -> bool {
        self.api.is_completed()
    }
}

impl Default for ApiAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for ApiAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match self.api.get() {
            Some(api) => api
                .malloc(layout.size(), layout.align())
                .map_or(ptr::null_mut(), |p| p.cast()),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(api) = self.api.get() {
            // SAFETY: GlobalAlloc callers pass back the pointer and layout
            // of an earlier alloc, which came from this table's malloc.
            unsafe { api.free(ptr.cast(), layout.size(), layout.align()) }
        }
    }
}
