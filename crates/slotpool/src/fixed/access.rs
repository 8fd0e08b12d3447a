//! Typed indexed access to a fixed pool

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use super::{FixedPool, FixedPoolFactory};
use crate::error::{PoolError, PoolResult};
use crate::utils::is_power_of_two;

/// Views the fixed pool for `align_of::<T>()` as an array of `T`
///
/// Element `i` lives at `base + i * size_of::<T>()`. Nothing is ever
/// recycled: once an index is used it stays that caller's business.
pub struct FixedPoolAccess<T> {
    pool: &'static FixedPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FixedPoolAccess<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FixedPoolAccess<T> {}

impl<T> FixedPoolAccess<T> {
    /// Resolves the pool for `T`'s alignment, creating a single-slot pool if
    /// none exists yet
    pub fn get() -> PoolResult<Self> {
        const {
            assert!(is_power_of_two(align_of::<T>()), "alignment has to be a power of two");
            assert!(size_of::<T>() > 0, "zero-sized types have no addressable slots");
        }

        Ok(Self {
            pool: FixedPoolFactory::pool(align_of::<T>())?,
            _marker: PhantomData,
        })
    }

    /// The underlying pool
    pub fn pool(&self) -> &'static FixedPool {
        self.pool
    }

    /// Number of `T` values that fit in the pool
    pub fn capacity(&self) -> usize {
        self.pool.size_bytes() / size_of::<T>()
    }

    /// Address of element `index`
    pub fn addr_of(&self, index: usize) -> PoolResult<NonNull<T>> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(PoolError::IndexOutOfBounds { index, capacity });
        }
        // SAFETY: index < capacity keeps the element inside the block; the
        // block is aligned to align_of::<T>() and the stride is size_of::<T>(),
        // a multiple of the alignment.
        Ok(unsafe { self.pool.base().cast::<T>().add(index) })
    }

    /// Reads element `index`
    ///
    /// # Safety
    ///
    /// - element `index` holds a valid `T` (the pool starts zeroed, which is
    ///   only valid for types where all-zero bytes are a valid value)
    /// - no other thread writes element `index` concurrently
    pub unsafe fn read(&self, index: usize) -> PoolResult<T> {
        let ptr = self.addr_of(index)?;
        // SAFETY: forwarded from the caller
        Ok(unsafe { ptr.as_ptr().read() })
    }

    /// Writes element `index`, without dropping the previous contents
    ///
    /// # Safety
    ///
    /// No other reference to element `index` is live and no other thread
    /// accesses it concurrently.
    pub unsafe fn write(&self, index: usize, value: T) -> PoolResult<()> {
        let ptr = self.addr_of(index)?;
        // SAFETY: forwarded from the caller
        unsafe { ptr.as_ptr().write(value) };
        Ok(())
    }

    /// Mutable reference to element `index`
    ///
    /// # Safety
    ///
    /// Element `index` holds a valid `T`, and for the returned lifetime no
    /// other reference to it exists, in this or any other accessor.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slot_mut(&self, index: usize) -> PoolResult<&mut T> {
        let ptr = self.addr_of(index)?;
        // SAFETY: forwarded from the caller
        Ok(unsafe { &mut *ptr.as_ptr() })
    }
}

impl<T> fmt::Debug for FixedPoolAccess<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPoolAccess")
            .field("type", &core::any::type_name::<T>())
            .field("pool", self.pool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(16))]
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Wide([u32; 4]);

    #[test]
    fn test_indexed_read_write() {
        FixedPoolFactory::create_pool(16, 8).unwrap();
        let access = FixedPoolAccess::<Wide>::get().unwrap();
        assert_eq!(access.capacity(), 8);

        unsafe {
            access.write(3, Wide([1, 2, 3, 4])).unwrap();
            assert_eq!(access.read(3).unwrap(), Wide([1, 2, 3, 4]));
            access.slot_mut(3).unwrap().0[0] = 10;
            assert_eq!(access.read(3).unwrap(), Wide([10, 2, 3, 4]));
            assert_eq!(access.read(0).unwrap(), Wide([0; 4]));
        }

        let distance = access.addr_of(1).unwrap().as_ptr().addr()
            - access.addr_of(0).unwrap().as_ptr().addr();
        assert_eq!(distance, 16);
        assert!(matches!(
            access.addr_of(8),
            Err(PoolError::IndexOutOfBounds {
                index: 8,
                capacity: 8
            })
        ));
    }
}
