//! Stateless container allocator backed by the pool registry

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use super::ContainerAllocator;
use crate::error::{PoolError, PoolResult};
use crate::registry::PoolRegistry;

/// Container allocator handing out slots from the registry pool of `T`
///
/// Zero-sized and stateless: every `PoolAlloc`, whatever its element type,
/// is a view onto the same process-wide registry, so all instances compare
/// equal and copying or rebinding one is free.
///
/// # Examples
/// ```
/// use nebula_slotpool::allocator::{ContainerAllocator, PoolAlloc};
///
/// let alloc = PoolAlloc::<u64>::new();
/// let slot = alloc.allocate(1)?;
/// unsafe {
///     alloc.construct(slot, 42);
///     assert_eq!(*slot.as_ptr(), 42);
///     alloc.destroy(slot);
///     alloc.deallocate(slot, 1)?;
/// }
/// # Ok::<(), nebula_slotpool::PoolError>(())
/// ```
pub struct PoolAlloc<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolAlloc<T> {
    /// Creates the allocator handle
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for PoolAlloc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolAlloc<T> {}

impl<T> Default for PoolAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PoolAlloc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolAlloc<{}>", core::any::type_name::<T>())
    }
}

impl<T, U> PartialEq<PoolAlloc<U>> for PoolAlloc<T> {
    fn eq(&self, _other: &PoolAlloc<U>) -> bool {
        true
    }
}

impl<T> Eq for PoolAlloc<T> {}

// SAFETY: PoolAlloc delegates to the registry pool for T.
// - slots are sized and aligned for T (Layout::array::<T> blocks)
// - a slot is handed out once until returned to the same pool
// - every PoolAlloc<T> resolves to that one pool, so all instances are interchangeable
unsafe impl<T: 'static> ContainerAllocator for PoolAlloc<T> {
    type Value = T;
    type Rebind<U: 'static> = PoolAlloc<U>;

    const IS_ALWAYS_EQUAL: bool = true;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = true;

    fn allocate(&self, n: usize) -> PoolResult<NonNull<T>> {
        let max = self.max_size();
        if n > max {
            return Err(PoolError::exceeds_max_size(n, max));
        }
        PoolRegistry::pool::<T>().lock().allocate(n)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) -> PoolResult<()> {
        // SAFETY: caller guarantees ptr came from allocate(n) on an equal
        // allocator, i.e. from this same registry pool.
        unsafe { PoolRegistry::pool::<T>().lock().deallocate(ptr, n) }
    }

    fn max_size(&self) -> usize {
        usize::MAX / size_of::<T>().max(1)
    }

    fn rebind<U: 'static>(&self) -> PoolAlloc<U> {
        PoolAlloc::new()
    }
}
