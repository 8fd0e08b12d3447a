//! Slot pool statistics

/// Point-in-time statistics of a slot pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total allocations performed
    pub total_allocs: u64,
    /// Total deallocations performed
    pub total_deallocs: u64,
    /// Highest number of slots handed out at once
    pub peak_in_use: usize,
    /// Slots currently handed out
    pub in_use: usize,
    /// Slots currently on the free list
    pub free_slots: usize,
    /// Size of each slot in bytes
    pub slot_size: usize,
    /// Sum of the slot counts of all blocks
    pub total_slots: usize,
    /// Number of blocks obtained from the system
    pub block_count: usize,
}

impl PoolStats {
    /// Bytes held by the pool, free or not
    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.total_slots * self.slot_size
    }
}
