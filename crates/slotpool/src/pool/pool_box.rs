//! Smart pointer for registry-pooled values

use core::fmt;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::error::PoolResult;
use crate::registry::PoolRegistry;

/// RAII smart pointer for a value stored in the registry pool of `T`
///
/// Similar to `Box`, but the storage comes from (and returns to) the
/// process-wide pool for `T`.
pub struct PoolBox<T: 'static> {
    ptr: NonNull<T>,
}

// SAFETY: PoolBox<T> owns its T exactly like Box<T>; the slot is returned
// through the registry's mutex, which is Sync.
unsafe impl<T: Send + 'static> Send for PoolBox<T> {}
// SAFETY: shared access only hands out &T.
unsafe impl<T: Sync + 'static> Sync for PoolBox<T> {}

impl<T: 'static> PoolBox<T> {
    /// Moves `value` into a slot of the registry pool for `T`
    #[must_use = "allocated value must be used"]
    pub fn new(value: T) -> PoolResult<Self> {
        let ptr = PoolRegistry::pool::<T>().lock().allocate(1)?;

        // SAFETY: ptr is a fresh, properly aligned slot sized for T.
        unsafe { ptr.as_ptr().write(value) };

        Ok(Self { ptr })
    }

    /// Consumes the `PoolBox` and returns the contained value
    #[must_use]
    pub fn into_inner(self) -> T {
        // SAFETY: Moving the value out of an owned slot.
        // - self.ptr points to an initialized T
        // - ManuallyDrop below prevents Drop from dropping it a second time
        let value = unsafe { ptr::read(self.ptr.as_ptr()) };
        let this = core::mem::ManuallyDrop::new(self);
        release(this.ptr);
        value
    }

    /// Raw address of the slot, stable for the lifetime of the box
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

fn release<T: 'static>(ptr: NonNull<T>) {
    // SAFETY: ptr was allocated from this pool by PoolBox::new and its value
    // is already dropped or moved out.
    let result = unsafe { PoolRegistry::pool::<T>().lock().deallocate(ptr, 1) };
    debug_assert!(result.is_ok(), "pool rejected its own slot: {result:?}");
}

impl<T: 'static> Deref for PoolBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr points to an initialized T owned by this box.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: 'static> DerefMut for PoolBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: &mut self guarantees exclusive access.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for PoolBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: 'static> Drop for PoolBox<T> {
    fn drop(&mut self) {
        // SAFETY: ptr points to an initialized T that nobody else references.
        unsafe { ptr::drop_in_place(self.ptr.as_ptr()) };
        release(self.ptr);
    }
}
