//! Growable freelist slot pool
//!
//! # Safety
//!
//! A slot is exactly `size_of::<T>()` bytes of raw storage inside a block
//! obtained from the system allocator. While a slot is free, its first
//! pointer-sized bytes hold the address of the next free slot (null ends the
//! list). `T` may be less aligned than a pointer, so the link is always read
//! and written unaligned.
//!
//! ## Invariants
//!
//! - `head` is null exactly when `tail` is null (empty free list)
//! - `tail` is the last free slot; its link is null
//! - `total_slots` equals the sum of the slot counts of all blocks
//! - `free_slots` equals the length of the free list
//! - Every block is released exactly once, when the pool drops

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use std::alloc;

#[cfg(feature = "logging")]
use tracing::debug;

use super::{PoolStats, SlotPoolConfig};
use crate::error::{PoolError, PoolResult};

/// One contiguous region obtained from the system allocator
struct Block {
    base: NonNull<u8>,
    layout: Layout,
}

impl Block {
    fn contains(&self, addr: usize) -> bool {
        let start = self.base.as_ptr().addr();
        addr >= start && addr - start < self.layout.size()
    }
}

/// Reads the free-list link stored in a free slot.
///
/// # Safety
///
/// `slot` must address a free slot of at least pointer size.
#[inline(always)]
unsafe fn read_link(slot: *mut u8) -> *mut u8 {
    // SAFETY: forwarded from the caller; unaligned read tolerates any T alignment
    unsafe { slot.cast::<*mut u8>().read_unaligned() }
}

/// Stores a free-list link in a slot.
///
/// # Safety
///
/// `slot` must address a slot of at least pointer size that holds no live value.
#[inline(always)]
unsafe fn write_link(slot: *mut u8, next: *mut u8) {
    // SAFETY: forwarded from the caller; unaligned write tolerates any T alignment
    unsafe { slot.cast::<*mut u8>().write_unaligned(next) }
}

/// Growable pool of fixed-size slots for values of type `T`
///
/// Slots are handed out one at a time from an intrusive free list. When the
/// list runs dry the pool grows by a single-slot block, so allocation only
/// fails if the system allocator does.
///
/// # Memory Layout
/// ```text
/// block 0: [s0][s1][s2]    block 1: [s3][s4]
///
/// free list: head → s1 → s2 → s3 → s4 (tail) → null
/// ```
///
/// Freed slots are pushed onto the head, so the most recently freed slot is
/// the next one handed out.
pub struct SlotPool<T> {
    /// First free slot, null when the free list is empty
    head: *mut u8,

    /// Last free slot, null when the free list is empty
    tail: *mut u8,

    /// Every block ever obtained, released on drop
    blocks: Vec<Block>,

    total_slots: usize,
    free_slots: usize,

    config: SlotPoolConfig,

    total_allocs: u64,
    total_deallocs: u64,
    peak_in_use: usize,

    _marker: PhantomData<fn() -> T>,
}

// SAFETY: SlotPool<T> can move between threads for any T.
// - The pool never stores or drops a T; slots are raw storage owned by the caller while allocated
// - head/tail only point into blocks owned exclusively by this pool
// - All mutation requires &mut self
unsafe impl<T> Send for SlotPool<T> {}

impl<T> SlotPool<T> {
    /// Creates an empty pool with default configuration
    ///
    /// No memory is reserved until the first [`add_memory`](Self::add_memory)
    /// or [`allocate`](Self::allocate).
    pub fn new() -> Self {
        Self::with_config(SlotPoolConfig::default())
    }

    /// Creates an empty pool with custom configuration
    pub fn with_config(config: SlotPoolConfig) -> Self {
        const {
            assert!(
                size_of::<T>() >= size_of::<*mut u8>(),
                "slot type is too small to hold a free-list link"
            );
        }

        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            blocks: Vec::new(),
            total_slots: 0,
            free_slots: 0,
            config,
            total_allocs: 0,
            total_deallocs: 0,
            peak_in_use: 0,
            _marker: PhantomData,
        }
    }

    /// Grows the pool by one block of `n` slots
    ///
    /// The new slots are appended to the end of the free list, or become the
    /// whole free list if it was empty.
    pub fn add_memory(&mut self, n: usize) -> PoolResult<()> {
        if n == 0 {
            return Err(PoolError::ZeroSlots);
        }

        let layout =
            Layout::array::<T>(n).map_err(|_| PoolError::size_overflow("slot pool block layout"))?;
        let total_slots = self
            .total_slots
            .checked_add(n)
            .ok_or_else(|| PoolError::size_overflow("slot pool slot count"))?;

        // SAFETY: layout has non-zero size (n > 0 and T holds at least a pointer).
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw).ok_or_else(|| PoolError::allocation_failed_with_layout(layout))?;

        let slot_size = size_of::<T>();
        let first = base.as_ptr();

        // SAFETY: Threading the free list through the fresh block.
        // - slot i starts at i * slot_size and ends inside the block for every i < n
        // - each slot is at least pointer-sized (compile-time check in with_config)
        // - nothing else references this memory yet
        let last = unsafe {
            let mut slot = first;
            for _ in 1..n {
                let next = slot.add(slot_size);
                write_link(slot, next);
                slot = next;
            }
            write_link(slot, ptr::null_mut());
            slot
        };

        if self.tail.is_null() {
            self.head = first;
        } else {
            // SAFETY: tail is the last free slot of this pool; it holds only its null link.
            unsafe { write_link(self.tail, first) };
        }
        self.tail = last;

        self.blocks.push(Block { base, layout });
        self.total_slots = total_slots;
        self.free_slots += n;

        #[cfg(feature = "logging")]
        debug!(
            slot_size,
            slots = n,
            blocks = self.blocks.len(),
            total_slots,
            "slot pool grown"
        );

        Ok(())
    }

    /// Hands out one uninitialized slot
    ///
    /// Only `n == 1` is supported. An empty free list triggers an implicit
    /// `add_memory(1)` first.
    pub fn allocate(&mut self, n: usize) -> PoolResult<NonNull<T>> {
        if n != 1 {
            return Err(PoolError::unsupported_slot_count(n));
        }

        if self.head.is_null() {
            self.add_memory(1)?;
        }

        // head is non-null after growth, but use explicit check
        let slot = NonNull::new(self.head)
            .ok_or_else(|| PoolError::allocation_failed_with_layout(Layout::new::<T>()))?;

        // SAFETY: slot is the head of the free list, so it holds a valid link.
        let next = unsafe { read_link(slot.as_ptr()) };
        self.head = next;
        if next.is_null() {
            self.tail = ptr::null_mut();
        }
        self.free_slots -= 1;

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the slot was just unlinked and spans size_of::<T>() bytes of this pool.
            unsafe { ptr::write_bytes(slot.as_ptr(), pattern, size_of::<T>()) };
        }

        if self.config.track_stats {
            self.total_allocs += 1;
            self.peak_in_use = self.peak_in_use.max(self.in_use());
        }

        Ok(slot.cast())
    }

    /// Returns one slot to the front of the free list
    ///
    /// The pool does not run destructors.
    ///
    /// # Safety
    ///
    /// Caller must ensure:
    /// - `slot` was returned by [`allocate`](Self::allocate) on this pool
    /// - `slot` has not been deallocated since
    /// - any value in the slot was already dropped or moved out
    pub unsafe fn deallocate(&mut self, slot: NonNull<T>, n: usize) -> PoolResult<()> {
        if n != 1 {
            return Err(PoolError::unsupported_slot_count(n));
        }

        let raw = slot.as_ptr().cast::<u8>();
        if self.config.check_ownership && !self.contains(raw) {
            return Err(PoolError::foreign_slot(raw));
        }

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: caller guarantees the slot belongs to this pool and holds no live value.
            unsafe { ptr::write_bytes(raw, pattern, size_of::<T>()) };
        }

        // SAFETY: caller guarantees the slot is a vacant slot of this pool.
        unsafe { write_link(raw, self.head) };
        if self.head.is_null() {
            self.tail = raw;
        }
        self.head = raw;
        self.free_slots += 1;

        if self.config.track_stats {
            self.total_deallocs += 1;
        }

        Ok(())
    }

    /// Reports whether the free list is empty
    ///
    /// Fails with [`PoolError::PoolNotCreated`] before the first growth.
    pub fn is_end_of_block(&self) -> PoolResult<bool> {
        if self.blocks.is_empty() {
            return Err(PoolError::PoolNotCreated);
        }
        Ok(self.head.is_null())
    }

    /// Size of each slot in bytes
    pub const fn slot_size(&self) -> usize {
        size_of::<T>()
    }

    /// Sum of the slot counts of all blocks
    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// Number of blocks obtained so far
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Slots currently on the free list
    pub fn free_slots(&self) -> usize {
        self.free_slots
    }

    /// Slots currently handed out
    pub fn in_use(&self) -> usize {
        self.total_slots - self.free_slots
    }

    /// Checks whether `ptr` addresses the start of a slot of this pool
    pub fn contains<P>(&self, ptr: *const P) -> bool {
        let addr = ptr.addr();
        self.blocks.iter().any(|block| {
            block.contains(addr)
                && (addr - block.base.as_ptr().addr()).is_multiple_of(size_of::<T>())
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SlotPoolConfig {
        &self.config
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            total_allocs: self.total_allocs,
            total_deallocs: self.total_deallocs,
            peak_in_use: self.peak_in_use,
            in_use: self.in_use(),
            free_slots: self.free_slots,
            slot_size: size_of::<T>(),
            total_slots: self.total_slots,
            block_count: self.blocks.len(),
        })
    }
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("type", &core::any::type_name::<T>())
            .field("slot_size", &size_of::<T>())
            .field("total_slots", &self.total_slots)
            .field("free_slots", &self.free_slots)
            .field("block_count", &self.blocks.len())
            .finish()
    }
}

impl<T> Drop for SlotPool<T> {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            // SAFETY: base came from alloc::alloc with exactly this layout and
            // is removed from the list, so it is released once.
            unsafe { alloc::dealloc(block.base.as_ptr(), block.layout) };
        }
    }
}
