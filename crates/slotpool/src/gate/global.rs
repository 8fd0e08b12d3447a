//! `GlobalAlloc` front-end consulting an [`AllocationGate`]

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use std::alloc::System;

use super::{AllocationGate, Route};

/// Global allocator that routes every request through an [`AllocationGate`]
///
/// - [`GateMode::Permit`](super::GateMode::Permit): the system allocator,
///   retrying through the gate's out-of-memory handler on failure
/// - [`GateMode::Preallocated`](super::GateMode::Preallocated): the gate's
///   reserved memory
/// - [`GateMode::Prohibit`](super::GateMode::Prohibit), or no reserved memory
///   installed: null
///
/// A null return makes the Rust runtime abort through
/// `handle_alloc_error`, so a refused request is fatal for the process.
/// Zero-size requests are served as one-byte requests.
///
/// # Examples
/// ```no_run
/// use nebula_slotpool::gate::{AllocationGate, GatedAllocator};
///
/// static GATE: AllocationGate = AllocationGate::new();
///
/// #[global_allocator]
/// static ALLOCATOR: GatedAllocator = GatedAllocator::new(&GATE);
///
/// fn main() {
///     let warmup = vec![0u8; 64];
///     GATE.prohibit();
///     // any allocation here aborts the process
///     GATE.permit();
///     drop(warmup);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GatedAllocator {
    gate: &'static AllocationGate,
}

impl GatedAllocator {
    /// Creates an allocator consulting `gate`
    pub const fn new(gate: &'static AllocationGate) -> Self {
        Self { gate }
    }

    /// The gate this allocator consults
    pub fn gate(&self) -> &'static AllocationGate {
        self.gate
    }

    /// Calls `attempt` until it succeeds or no out-of-memory handler is set
    #[inline]
    fn retry_on_oom(&self, mut attempt: impl FnMut() -> *mut u8) -> *mut u8 {
        loop {
            let ptr = attempt();
            if !ptr.is_null() {
                return ptr;
            }
            match self.gate.oom_handler() {
                Some(handler) => handler(),
                None => return ptr,
            }
        }
    }

    fn is_reserved(&self, ptr: *const u8) -> bool {
        self.gate.reserved().is_some_and(|reserved| reserved.owns(ptr))
    }

    /// # Safety
    ///
    /// Same contract as [`GlobalAlloc::alloc`].
    unsafe fn alloc_routed(&self, layout: Layout, zeroed: bool) -> *mut u8 {
        let layout = normalized(layout);
        match self.gate.route(layout) {
            Ok(Route::System) => self.retry_on_oom(|| {
                // SAFETY: layout has non-zero size after normalization.
                unsafe {
                    if zeroed {
                        System.alloc_zeroed(layout)
                    } else {
                        System.alloc(layout)
                    }
                }
            }),
            Ok(Route::Reserved(reserved)) => match reserved.allocate(layout) {
                Some(ptr) => {
                    if zeroed {
                        // SAFETY: the reserve just handed out layout.size() bytes at ptr.
                        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };
                    }
                    ptr.as_ptr()
                },
                None => ptr::null_mut(),
            },
            Err(_) => ptr::null_mut(),
        }
    }
}

/// Zero-size layouts become one-byte layouts of the same alignment
#[inline]
fn normalized(layout: Layout) -> Layout {
    if layout.size() == 0 {
        Layout::from_size_align(1, layout.align()).unwrap_or(layout)
    } else {
        layout
    }
}

// SAFETY: GatedAllocator upholds the GlobalAlloc contract.
// - system-routed memory comes from and returns to std::alloc::System with the same normalized layout
// - reserved memory is returned to the reserve that owns it, whatever the current mode
// - failure is reported as null, never by unwinding
// - the allocation path neither allocates nor logs nor takes a lock
unsafe impl GlobalAlloc for GatedAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded from the caller
        unsafe { self.alloc_routed(layout, false) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded from the caller
        unsafe { self.alloc_routed(layout, true) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let layout = normalized(layout);
        if let Some(reserved) = self.gate.reserved()
            && reserved.owns(ptr)
        {
            if let Some(ptr) = NonNull::new(ptr) {
                // SAFETY: the reserve owns ptr, so it handed it out for this layout.
                unsafe { reserved.deallocate(ptr, layout) };
            }
            return;
        }
        // SAFETY: ptr is not reserved memory, so System allocated it with this layout.
        unsafe { System.dealloc(ptr, layout) };
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let Ok(new_layout) = Layout::from_size_align(new_size.max(1), layout.align()) else {
            return ptr::null_mut();
        };

        // System to system: let the system allocator resize in place
        if !self.is_reserved(ptr) && matches!(self.gate.route(new_layout), Ok(Route::System)) {
            let old_layout = normalized(layout);
            return self.retry_on_oom(|| {
                // SAFETY: ptr came from System with old_layout; new size is non-zero.
                unsafe { System.realloc(ptr, old_layout, new_layout.size()) }
            });
        }

        // Crossing paths: allocate on the new route, copy, release on the old one
        // SAFETY: new_layout has non-zero size.
        let new_ptr = unsafe { self.alloc(new_layout) };
        if !new_ptr.is_null() {
            // SAFETY: both blocks are valid for the copied length and do not overlap.
            unsafe {
                ptr::copy_nonoverlapping(ptr, new_ptr, layout.size().min(new_size));
                self.dealloc(ptr, layout);
            }
        }
        new_ptr
    }
}
