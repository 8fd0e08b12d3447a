//! Fixed aligned pool
//!
//! # Safety
//!
//! One zero-initialized block of `alignment × slot_count` bytes, aligned to
//! `alignment`. Slots are addressed by index only and never recycled. The
//! pool hands out raw addresses; whoever writes through them is responsible
//! for not racing on the same bytes.

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;
use std::alloc;

use crate::error::{PoolError, PoolResult};
use crate::utils::is_power_of_two;

/// Non-growable pool of `slot_count` equally spaced slots
pub struct FixedPool {
    base: NonNull<u8>,
    layout: Layout,
    alignment: usize,
    slot_count: usize,
}

// SAFETY: FixedPool only exposes its storage as raw pointers.
// - the block is owned exclusively and released once, in Drop
// - base/layout/alignment/slot_count are immutable after construction
// - any dereference of a slot address is an unsafe operation whose contract
//   forbids unsynchronized access to the same slot
unsafe impl Send for FixedPool {}
// SAFETY: see Send; &FixedPool only permits reading immutable metadata.
unsafe impl Sync for FixedPool {}

impl FixedPool {
    /// Reserves `slot_count` slots spaced `alignment` bytes apart
    pub fn new(alignment: usize, slot_count: usize) -> PoolResult<Self> {
        if !is_power_of_two(alignment) {
            return Err(PoolError::invalid_alignment(alignment));
        }
        if slot_count == 0 {
            return Err(PoolError::ZeroSlots);
        }

        let size = alignment
            .checked_mul(slot_count)
            .ok_or_else(|| PoolError::size_overflow("fixed pool size"))?;
        let layout = Layout::from_size_align(size, alignment)
            .map_err(|_| PoolError::size_overflow("fixed pool layout"))?;

        // SAFETY: layout has non-zero size (alignment >= 1, slot_count >= 1).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(raw).ok_or_else(|| PoolError::allocation_failed_with_layout(layout))?;

        Ok(Self {
            base,
            layout,
            alignment,
            slot_count,
        })
    }

    /// Start of the pool's block
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Distance in bytes between consecutive slots
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Size of the block in bytes
    pub fn size_bytes(&self) -> usize {
        self.layout.size()
    }

    /// Address of slot `index`
    pub fn slot(&self, index: usize) -> PoolResult<NonNull<u8>> {
        if index >= self.slot_count {
            return Err(PoolError::IndexOutOfBounds {
                index,
                capacity: self.slot_count,
            });
        }
        // SAFETY: index * alignment < size_bytes, so the offset stays inside the block.
        Ok(unsafe { self.base.add(index * self.alignment) })
    }

    /// Checks if a pointer falls inside the pool's block
    pub fn contains<T>(&self, ptr: *const T) -> bool {
        let start = self.base.as_ptr().addr();
        let addr = ptr.addr();
        addr >= start && addr - start < self.layout.size()
    }
}

impl fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("base", &self.base)
            .field("alignment", &self.alignment)
            .field("slot_count", &self.slot_count)
            .finish()
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        // SAFETY: base came from alloc_zeroed with self.layout.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}
