//! End-to-end behavior of the growable slot pool.

use nebula_slotpool::{PoolError, SlotPool, SlotPoolConfig};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
    id: u64,
    weight: f64,
}

fn pool() -> SlotPool<Node> {
    SlotPool::with_config(SlotPoolConfig::production())
}

// ---------------------------------------------------------------------------
// Growth and recycling
// ---------------------------------------------------------------------------

#[test]
fn three_blocks_then_implicit_growth_then_lifo_reuse() {
    let mut pool = pool();
    for _ in 0..3 {
        pool.add_memory(3).unwrap();
    }
    assert_eq!(pool.block_count(), 3);
    assert_eq!(pool.total_slots(), 9);

    let slots: Vec<_> = (0..9).map(|_| pool.allocate(1).unwrap()).collect();
    // nine allocations fit the reserved slots without growing
    assert_eq!(pool.block_count(), 3);
    assert_eq!(pool.total_slots(), 9);
    assert_eq!(pool.is_end_of_block(), Ok(true));

    let tenth = pool.allocate(1).unwrap();
    assert_eq!(pool.block_count(), 4);
    assert_eq!(pool.total_slots(), 10);

    let ninth = slots[8];
    unsafe {
        pool.deallocate(tenth, 1).unwrap();
        pool.deallocate(ninth, 1).unwrap();
    }

    assert_eq!(pool.allocate(1).unwrap(), ninth);
    assert_eq!(pool.allocate(1).unwrap(), tenth);
    assert_eq!(pool.in_use(), 10);
}

#[test]
fn slots_keep_their_values_across_growth() {
    let mut pool = pool();
    pool.add_memory(2).unwrap();

    let written: Vec<_> = (0..6u64)
        .map(|id| {
            let slot = pool.allocate(1).unwrap();
            unsafe {
                slot.as_ptr().write(Node {
                    id,
                    weight: id as f64 * 0.5,
                });
            }
            slot
        })
        .collect();

    // 2 explicit slots plus 4 single-slot growths
    assert_eq!(pool.block_count(), 5);

    for (id, slot) in written.iter().enumerate() {
        let node = unsafe { slot.as_ptr().read() };
        assert_eq!(node.id, id as u64);
        assert_eq!(node.weight, id as f64 * 0.5);
    }
}

#[test]
fn free_slots_survive_growth_in_order() {
    let mut pool = pool();
    pool.add_memory(3).unwrap();
    let a = pool.allocate(1).unwrap();

    pool.add_memory(2).unwrap();
    assert_eq!(pool.free_slots(), 4);

    // remaining slots of the first block come before the new block
    let b = pool.allocate(1).unwrap();
    assert_eq!(
        b.as_ptr().addr() - a.as_ptr().addr(),
        size_of::<Node>()
    );
    let _c = pool.allocate(1).unwrap();
    let d = pool.allocate(1).unwrap();
    assert!(pool.contains(d.as_ptr()));
    assert_eq!(pool.free_slots(), 1);
}

#[test]
fn accounting_matches_stats() {
    let mut pool = pool();
    pool.add_memory(8).unwrap();

    let held: Vec<_> = (0..5).map(|_| pool.allocate(1).unwrap()).collect();
    for slot in &held[..3] {
        unsafe { pool.deallocate(*slot, 1).unwrap() };
    }

    let stats = pool.stats().unwrap();
    assert_eq!(stats.total_allocs, 5);
    assert_eq!(stats.total_deallocs, 3);
    assert_eq!(stats.peak_in_use, 5);
    assert_eq!(stats.in_use, 2);
    assert_eq!(stats.free_slots, 6);
    assert_eq!(stats.total_slots, 8);
    assert_eq!(stats.block_count, 1);
    assert_eq!(stats.slot_size, size_of::<Node>());
}

// ---------------------------------------------------------------------------
// Misuse surfaces as errors
// ---------------------------------------------------------------------------

#[test]
fn misuse_is_reported() {
    let mut pool = pool();
    assert_eq!(pool.is_end_of_block(), Err(PoolError::PoolNotCreated));
    assert_eq!(pool.add_memory(0), Err(PoolError::ZeroSlots));

    let err = pool.allocate(4).unwrap_err();
    assert_eq!(err, PoolError::UnsupportedSlotCount { requested: 4 });
    assert_eq!(err.code(), "POOL:SLOT:COUNT");
    assert!(!err.is_retryable());

    // nothing was reserved by the failed calls
    assert_eq!(pool.block_count(), 0);
}

#[test]
fn foreign_pointer_rejected_with_ownership_checks() {
    let mut pool = SlotPool::<Node>::with_config(SlotPoolConfig::debug());
    pool.add_memory(1).unwrap();

    let mut other = SlotPool::<Node>::with_config(SlotPoolConfig::debug());
    let stranger = other.allocate(1).unwrap();

    let err = unsafe { pool.deallocate(stranger, 1) }.unwrap_err();
    assert!(matches!(err, PoolError::ForeignSlot { .. }));
    assert_eq!(pool.free_slots(), 1);

    unsafe { other.deallocate(stranger, 1).unwrap() };
}
