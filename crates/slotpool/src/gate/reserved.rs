//! Alternate allocation path for a closed-to-OS gate

use core::alloc::Layout;
use core::cell::UnsafeCell;
use core::fmt;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::checked_align_up;

/// Memory set aside up front, served when the gate is in
/// [`GateMode::Preallocated`](super::GateMode::Preallocated)
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `allocate` returns memory valid for `layout`, disjoint from every other
///   live allocation, or `None`
/// - `owns` is `true` for every pointer `allocate` returned and `false` for
///   any pointer from another allocator
/// - no method allocates through the global allocator or blocks
pub unsafe trait ReservedMemory: Sync {
    /// Serves a request, `None` when the reserve is exhausted
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Releases memory previously returned by `allocate`
    ///
    /// # Safety
    ///
    /// `ptr` was returned by `allocate(layout)` on `self` and is not used
    /// afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether `ptr` lies inside this reserve
    fn owns(&self, ptr: *const u8) -> bool;
}

/// Bump arena over an inline buffer of `N` bytes, usable in a `static`
///
/// Allocation advances an atomic cursor; deallocation is a no-op, so the
/// reserve only ever shrinks. Any power-of-two alignment is honored as long
/// as the padded request still fits.
///
/// ```
/// use core::alloc::Layout;
/// use nebula_slotpool::gate::{ReservedArena, ReservedMemory};
///
/// static ARENA: ReservedArena<1024> = ReservedArena::new();
///
/// let ptr = ARENA.allocate(Layout::new::<u64>()).unwrap();
/// assert!(ARENA.owns(ptr.as_ptr()));
/// assert!(ARENA.used() >= 8);
/// ```
pub struct ReservedArena<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    cursor: AtomicUsize,
}

// SAFETY: ReservedArena hands out disjoint byte ranges.
// - every range is claimed by a successful CAS on `cursor`, so no two callers get overlapping bytes
// - the arena itself never reads or writes `storage` after construction
unsafe impl<const N: usize> Sync for ReservedArena<N> {}

impl<const N: usize> ReservedArena<N> {
    /// Creates an empty arena
    pub const fn new() -> Self {
        Self {
            storage: UnsafeCell::new([0; N]),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Total size in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes handed out so far, including alignment padding
    pub fn used(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Bytes left
    pub fn remaining(&self) -> usize {
        N - self.used()
    }

    fn base(&self) -> *mut u8 {
        self.storage.get().cast()
    }
}

impl<const N: usize> Default for ReservedArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for ReservedArena<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservedArena")
            .field("capacity", &N)
            .field("used", &self.used())
            .finish()
    }
}

// SAFETY: see the Sync impl; owns() covers exactly the inline buffer and
// nothing here allocates or blocks.
unsafe impl<const N: usize> ReservedMemory for ReservedArena<N> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let base = self.base().addr();
        let mut start = 0;

        self.cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                let aligned = checked_align_up(base.checked_add(cursor)?, layout.align())? - base;
                let end = aligned.checked_add(layout.size())?;
                if end > N {
                    return None;
                }
                start = aligned;
                Some(end)
            })
            .ok()?;

        // SAFETY: start + layout.size() <= N, so the range is inside storage.
        NonNull::new(unsafe { self.base().add(start) })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn owns(&self, ptr: *const u8) -> bool {
        let start = self.base().addr();
        let addr = ptr.addr();
        addr >= start && addr - start < N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_aligned_ptr;

    #[test]
    fn test_bump_respects_alignment() {
        let arena = ReservedArena::<512>::new();
        let byte = arena.allocate(Layout::new::<u8>()).unwrap();
        let wide = arena.allocate(Layout::from_size_align(32, 64).unwrap()).unwrap();

        assert!(is_aligned_ptr(wide.as_ptr(), 64));
        assert!(wide.as_ptr().addr() > byte.as_ptr().addr());
        assert!(arena.owns(byte.as_ptr()) && arena.owns(wide.as_ptr()));
        assert!(arena.used() >= 33);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let arena = ReservedArena::<64>::new();
        assert!(arena.allocate(Layout::from_size_align(48, 1).unwrap()).is_some());
        assert!(arena.allocate(Layout::from_size_align(32, 1).unwrap()).is_none());
        assert_eq!(arena.remaining(), 16);
        assert!(arena.allocate(Layout::from_size_align(16, 1).unwrap()).is_some());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_foreign_pointer_not_owned() {
        let arena = ReservedArena::<64>::new();
        let outside = 0u8;
        assert!(!arena.owns(&raw const outside));
        assert_eq!(arena.capacity(), 64);
    }
}
